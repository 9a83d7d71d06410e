//! Organization-user (B2B) cart and order tools.
//!
//! These address `/orgUsers/{id}` rather than `/users/{id}` and pass most
//! inputs as query parameters instead of a JSON body.

use std::sync::Arc;

use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Number, Value, json};

use super::api::CommerceApi;
use super::format::{format_b2b_cart, format_b2b_order};
use super::models::{B2BCart, B2BOrder, Entry};
use super::tools::{non_empty, required};
use crate::context::CallContext;
use crate::error::ToolError;
use crate::tools::{
    InputSchema, ParamType, RegistryError, ToolDescriptor, ToolHandler, ToolRegistry, ToolResponse,
    parse_args,
};

const BASE_SITE_DOC: &str = "Base site identifier (e.g., 'powertools-spa')";
const ORG_USER_DOC: &str = "Organization user identifier (e.g., 'mark.rivers@pronto-hw.com')";
const CART_DOC: &str = "Cart identifier (default: 'current')";
const FIELDS_DOC: &str = "Response field configuration";

fn number_or_blank(n: &Option<Number>) -> String {
    n.as_ref().map(ToString::to_string).unwrap_or_default()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddArgs {
    base_site_id: String,
    org_user_id: String,
    product_code: String,
    quantity: i64,
    pickup_store: Option<String>,
    fields: String,
    cart_id: String,
}

struct B2BAddToCart {
    api: Arc<CommerceApi>,
}

#[async_trait::async_trait]
impl ToolHandler for B2BAddToCart {
    async fn call(&self, args: Map<String, Value>, ctx: &CallContext) -> Result<ToolResponse, ToolError> {
        let args: AddArgs = parse_args(args)?;

        let quantity = if args.quantity != 0 { args.quantity } else { 1 }.to_string();
        let mut params = vec![
            ("quantity", quantity.as_str()),
            ("code", args.product_code.as_str()),
            ("lang", "en"),
            ("curr", "USD"),
        ];
        params.extend(non_empty(&args.pickup_store).map(|s| ("pickupStore", s)));
        params.push(("fields", args.fields.as_str()));

        let url = self.api.endpoint(
            &[&args.base_site_id, "orgUsers", &args.org_user_id, "carts", &args.cart_id, "entries"],
            &params,
        );
        let entry: Entry = required(
            self.api.send(Method::POST, url, None, ctx).await?,
            "Failed to add product to B2B cart. The API returned no data.",
        )?;

        let product_name = entry
            .product
            .as_ref()
            .and_then(|p| non_empty(&p.name))
            .unwrap_or(&args.product_code);
        let mut lines = vec![
            "**Product Added to B2B Cart**".to_string(),
            format!("Product: {product_name}"),
            format!("Quantity: {}", number_or_blank(&entry.quantity)),
            format!("Entry Number: {}", number_or_blank(&entry.entry_number)),
        ];
        if let Some(total) = &entry.total_price {
            lines.push(format!("Total Price: {}", total.display()));
        }
        if let Some(pos) = &entry.delivery_point_of_service {
            lines.push(format!("Pickup Store: {}", pos.label()));
        }

        Ok(ToolResponse::text(lines.join("\n")))
    }
}

fn b2b_add_to_cart(api: &Arc<CommerceApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "b2b-add-to-cart",
        "Add a product to an organization user's B2B cart in SAP Commerce",
        InputSchema::new()
            .required("baseSiteId", ParamType::String, BASE_SITE_DOC)
            .required("orgUserId", ParamType::String, "Organization user identifier (use 'current' for authenticated user)")
            .required("productCode", ParamType::String, "Product code to add to cart")
            .with_default("quantity", ParamType::Integer, 1, "Quantity to add (default: 1)")
            .optional("pickupStore", ParamType::String, "Pickup store name for in-store pickup")
            .with_default("fields", ParamType::String, "DEFAULT", FIELDS_DOC)
            .with_default("cartId", ParamType::String, "current", CART_DOC),
        Arc::new(B2BAddToCart {
            api: Arc::clone(api),
        }),
    )
    .failure_prefix("Error adding product to B2B cart")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartArgs {
    base_site_id: String,
    org_user_id: String,
    cart_id: String,
    fields: String,
}

struct B2BGetCart {
    api: Arc<CommerceApi>,
}

#[async_trait::async_trait]
impl ToolHandler for B2BGetCart {
    async fn call(&self, args: Map<String, Value>, ctx: &CallContext) -> Result<ToolResponse, ToolError> {
        let args: CartArgs = parse_args(args)?;
        let url = self.api.endpoint(
            &[&args.base_site_id, "orgUsers", &args.org_user_id, "carts", &args.cart_id],
            &[("fields", args.fields.as_str())],
        );

        let cart: B2BCart = required(
            self.api.get(url, ctx).await?,
            "Failed to retrieve B2B cart. The cart may not exist or you may not have access.",
        )?;

        Ok(ToolResponse::text(format!(
            "B2B Cart details:\n\n{}",
            format_b2b_cart(&cart)
        )))
    }
}

fn b2b_get_cart(api: &Arc<CommerceApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "b2b-get-cart",
        "Get organization user's current B2B cart details from SAP Commerce",
        InputSchema::new()
            .required("baseSiteId", ParamType::String, BASE_SITE_DOC)
            .required("orgUserId", ParamType::String, ORG_USER_DOC)
            .with_default("cartId", ParamType::String, "current", CART_DOC)
            .with_default("fields", ParamType::String, "DEFAULT", FIELDS_DOC),
        Arc::new(B2BGetCart {
            api: Arc::clone(api),
        }),
    )
    .failure_prefix("Error retrieving B2B cart")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateArgs {
    base_site_id: String,
    org_user_id: String,
    entry_number: i64,
    quantity: i64,
    cart_id: String,
    fields: String,
}

struct B2BUpdateCartEntry {
    api: Arc<CommerceApi>,
}

#[async_trait::async_trait]
impl ToolHandler for B2BUpdateCartEntry {
    async fn call(&self, args: Map<String, Value>, ctx: &CallContext) -> Result<ToolResponse, ToolError> {
        let args: UpdateArgs = parse_args(args)?;
        let entry_number = args.entry_number.to_string();
        let url = self.api.endpoint(
            &[
                &args.base_site_id,
                "orgUsers",
                &args.org_user_id,
                "carts",
                &args.cart_id,
                "entries",
                &entry_number,
            ],
            &[("fields", args.fields.as_str())],
        );

        if args.quantity == 0 {
            self.api.send::<Value>(Method::DELETE, url, None, ctx).await?;
            return Ok(ToolResponse::text(format!(
                "Entry {entry_number} has been removed from the B2B cart."
            )));
        }

        let entry: Entry = required(
            self.api
                .send(Method::PUT, url, Some(json!({"quantity": args.quantity})), ctx)
                .await?,
            "Failed to update B2B cart entry. The API returned no data.",
        )?;

        let mut lines = vec![
            "**B2B Cart Entry Updated**".to_string(),
            format!(
                "Product: {}",
                entry
                    .product
                    .as_ref()
                    .and_then(|p| non_empty(&p.name))
                    .unwrap_or("N/A")
            ),
            format!("Entry Number: {}", number_or_blank(&entry.entry_number)),
            format!("New Quantity: {}", number_or_blank(&entry.quantity)),
        ];
        if let Some(total) = &entry.total_price {
            lines.push(format!("Total Price: {}", total.display()));
        }

        Ok(ToolResponse::text(lines.join("\n")))
    }
}

fn b2b_update_cart_entry(api: &Arc<CommerceApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "b2b-update-cart-entry",
        "Update the quantity of a product in an organization user's B2B cart or remove it entirely",
        InputSchema::new()
            .required("baseSiteId", ParamType::String, BASE_SITE_DOC)
            .required("orgUserId", ParamType::String, ORG_USER_DOC)
            .required("entryNumber", ParamType::Integer, "Cart entry number to update")
            .required("quantity", ParamType::Integer, "New quantity (use 0 to remove the item)")
            .with_default("cartId", ParamType::String, "current", CART_DOC)
            .with_default("fields", ParamType::String, "DEFAULT", FIELDS_DOC),
        Arc::new(B2BUpdateCartEntry {
            api: Arc::clone(api),
        }),
    )
    .failure_prefix("Error updating B2B cart entry")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceArgs {
    base_site_id: String,
    org_user_id: String,
    cart_id: String,
    purchase_order_number: Option<String>,
    fields: String,
    terms_checked: bool,
}

struct B2BPlaceOrder {
    api: Arc<CommerceApi>,
}

#[async_trait::async_trait]
impl ToolHandler for B2BPlaceOrder {
    async fn call(&self, args: Map<String, Value>, ctx: &CallContext) -> Result<ToolResponse, ToolError> {
        let args: PlaceArgs = parse_args(args)?;

        let mut params = vec![("cartId", args.cart_id.as_str())];
        params.extend(non_empty(&args.purchase_order_number).map(|po| ("purchaseOrderNumber", po)));
        if args.terms_checked {
            params.push(("termsChecked", "true"));
        }
        params.push(("fields", args.fields.as_str()));

        let url = self.api.endpoint(
            &[&args.base_site_id, "orgUsers", &args.org_user_id, "orders"],
            &params,
        );
        let order: B2BOrder = required(
            self.api.send(Method::POST, url, None, ctx).await?,
            "Failed to place B2B order. The API returned no data.",
        )?;

        Ok(ToolResponse::text(format_b2b_order(&order)))
    }
}

fn b2b_place_order(api: &Arc<CommerceApi>) -> ToolDescriptor {
    ToolDescriptor::new(
        "b2b-place-order",
        "Place an order from an organization user's B2B cart in SAP Commerce",
        InputSchema::new()
            .required("baseSiteId", ParamType::String, BASE_SITE_DOC)
            .required("orgUserId", ParamType::String, ORG_USER_DOC)
            .with_default("cartId", ParamType::String, "current", CART_DOC)
            .optional("purchaseOrderNumber", ParamType::String, "Purchase order number for B2B tracking")
            .with_default("fields", ParamType::String, "DEFAULT", FIELDS_DOC)
            .with_default("termsChecked", ParamType::Boolean, false, "Accept terms and conditions"),
        Arc::new(B2BPlaceOrder {
            api: Arc::clone(api),
        }),
    )
    .failure_prefix("Error placing B2B order")
}

pub fn register(registry: &mut ToolRegistry, api: &Arc<CommerceApi>) -> Result<(), RegistryError> {
    for descriptor in [
        b2b_add_to_cart(api),
        b2b_get_cart(api),
        b2b_update_cart_entry(api),
        b2b_place_order(api),
    ] {
        registry.register(descriptor)?;
    }
    Ok(())
}
