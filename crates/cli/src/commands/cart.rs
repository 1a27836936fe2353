//! Cart commands.

use pebble_core::ProductId;
use pebble_storefront::models::Cart;
use pebble_storefront::services::cart::{
    AddOrigin, CartCommand, CartService, parse_quantity,
};
use pebble_storefront::services::product_detail::{DetailSelection, QuantityStepper};
use pebble_storefront::storage::KeyValueStore;

use super::{CommandError, catalog_client, emit, emit_toasts, product_id};

/// Print the cart lines and total.
pub fn show(store: &dyn KeyValueStore) {
    for line in render(&CartService::new(store).load()) {
        emit(line);
    }
}

/// Add a product, with optional quantity and variation choices.
pub async fn add(
    store: &dyn KeyValueStore,
    id: &str,
    quantity: &str,
    options: &[String],
) -> Result<(), CommandError> {
    let id = product_id(id)?;
    let selection = selection(id, quantity, options)?;

    let (client, _) = catalog_client()?;
    let product = client.fetch_product_by_id(store, id).await?;

    // A bare add behaves like the listing grid's button
    let origin = if selection == DetailSelection::for_product(id) {
        AddOrigin::Listing
    } else {
        AddOrigin::Detail
    };

    let outcome = CartService::new(store).apply(CartCommand::Add {
        product,
        quantity: selection.quantity.value(),
        variations: selection.chosen_variations(),
        origin,
    });
    emit_toasts(&outcome.render);
    Ok(())
}

/// Increase a line by one.
pub fn increment(store: &dyn KeyValueStore, id: &str) -> Result<(), CommandError> {
    let id = line_id(store, id)?;
    change(store, CartCommand::Increment(id));
    Ok(())
}

/// Decrease a line by one, never below 1.
pub fn decrement(store: &dyn KeyValueStore, id: &str) -> Result<(), CommandError> {
    let id = line_id(store, id)?;
    change(store, CartCommand::Decrement(id));
    Ok(())
}

/// Set a line's quantity from a typed value.
pub fn set(store: &dyn KeyValueStore, id: &str, quantity: &str) -> Result<(), CommandError> {
    let id = line_id(store, id)?;
    change(
        store,
        CartCommand::SetQuantity {
            id,
            quantity: parse_quantity(quantity),
        },
    );
    Ok(())
}

/// Remove a line.
pub fn remove(store: &dyn KeyValueStore, id: &str) -> Result<(), CommandError> {
    let id = line_id(store, id)?;
    change(store, CartCommand::Remove(id));
    Ok(())
}

/// Empty the cart.
pub fn clear(store: &dyn KeyValueStore) {
    change(store, CartCommand::Clear);
}

/// Place the simulated order.
pub fn checkout(store: &dyn KeyValueStore) -> Result<(), CommandError> {
    let outcome = CartService::new(store).checkout()?;
    emit_toasts(&outcome.render);
    Ok(())
}

fn change(store: &dyn KeyValueStore, command: CartCommand) {
    let outcome = CartService::new(store).apply(command);
    for line in render(&outcome.cart) {
        emit(line);
    }
}

/// Resolve an id that must name an existing cart line.
fn line_id(store: &dyn KeyValueStore, raw: &str) -> Result<ProductId, CommandError> {
    let id = product_id(raw)?;
    if CartService::new(store).load().line(id).is_none() {
        return Err(CommandError::NotInCart(id));
    }
    Ok(id)
}

/// Build the detail selection described by `--quantity` and `--option`.
fn selection(
    id: ProductId,
    quantity: &str,
    options: &[String],
) -> Result<DetailSelection, CommandError> {
    let mut selection = DetailSelection::for_product(id);
    selection.quantity = QuantityStepper::from_input(quantity);

    for option in options {
        let known = option
            .split_once('=')
            .is_some_and(|(group, value)| selection.select(group.trim(), value.trim()));
        if !known {
            return Err(CommandError::UnknownOption(option.clone()));
        }
    }
    Ok(selection)
}

fn render(cart: &Cart) -> Vec<String> {
    if cart.is_empty() {
        return vec!["Your cart is empty".to_string()];
    }

    let mut lines: Vec<String> = cart
        .items()
        .iter()
        .map(|line| {
            let variations = line
                .selected_variations
                .as_ref()
                .filter(|v| !v.is_empty())
                .map(|v| {
                    let chosen: Vec<String> =
                        v.iter().map(|(name, value)| format!("{name}: {value}")).collect();
                    format!(" ({})", chosen.join(", "))
                })
                .unwrap_or_default();
            format!(
                "{:>4}  {} x {}{}  {}",
                line.id.to_string(),
                line.quantity,
                line.title,
                variations,
                line.line_total()
            )
        })
        .collect();
    lines.push(format!("Total: {} ({} items)", cart.total(), cart.item_count()));
    lines
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pebble_core::Price;
    use pebble_storefront::models::CartLineItem;
    use pebble_storefront::storage::FileStore;

    use super::*;

    #[test]
    fn test_selection_parses_options() {
        let selection =
            selection(ProductId::new(1), "3", &["Size = XL".to_string()]).unwrap();

        assert_eq!(selection.quantity.value(), 3);
        assert!(selection.is_selected("Size", "XL"));
    }

    #[test]
    fn test_selection_rejects_unknown_option() {
        let err = selection(ProductId::new(1), "1", &["Size".to_string()]).unwrap_err();
        assert!(matches!(err, CommandError::UnknownOption(_)));

        let err = selection(ProductId::new(1), "1", &["Flavor=Mint".to_string()]).unwrap_err();
        assert_eq!(err.to_string(), "Unknown option: Flavor=Mint");
    }

    #[test]
    fn test_render_lines_and_total() {
        let cart = Cart::from_items(vec![CartLineItem {
            id: ProductId::new(4),
            title: "Tee".to_string(),
            price: Price::from_cents(1000),
            image: "tee.png".to_string(),
            quantity: 2,
            selected_variations: None,
        }]);

        let lines = render(&cart);

        assert_eq!(lines[0], "   4  2 x Tee  $20.00");
        assert_eq!(lines[1], "Total: $20.00 (2 items)");
        assert_eq!(render(&Cart::new()), vec!["Your cart is empty"]);
    }

    #[test]
    fn test_line_commands_need_existing_line() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("profile.json"));

        let err = increment(&store, "3").unwrap_err();
        assert!(matches!(err, CommandError::NotInCart(id) if id == ProductId::new(3)));
        assert!(matches!(remove(&store, "x").unwrap_err(), CommandError::Catalog(_)));
    }

    #[test]
    fn test_clear_persists_to_profile() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("profile.json"));
        CartService::new(&store).apply(CartCommand::Increment(ProductId::new(1)));

        clear(&store);

        assert!(CartService::new(&store).load().is_empty());
        assert!(store.path().exists());
    }
}
