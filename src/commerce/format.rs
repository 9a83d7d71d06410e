//! Plain-text rendering of OCC records.
//!
//! Output is markdown-flavoured text meant for an LLM to read back to a
//! shopper. Absent fields are skipped; empty strings and zero counts are
//! treated as absent too.

use chrono::DateTime;
use serde_json::Number;

use super::models::{
    Address, B2BCart, B2BOrder, Cart, DeliveryMode, Entry, Order, OrderHistory, Price, Product,
};

/// Non-empty string field.
fn text(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// Non-zero numeric field.
fn count(field: &Option<Number>) -> Option<&Number> {
    field
        .as_ref()
        .filter(|n| n.as_f64().is_some_and(|v| v != 0.0))
}

fn price(field: &Option<Price>) -> Option<String> {
    field.as_ref().map(Price::display)
}

fn number_or_blank(field: &Option<Number>) -> String {
    field.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn or_default<'a>(field: &'a Option<String>, fallback: &'a str) -> &'a str {
    text(field).unwrap_or(fallback)
}

/// `M/D/YYYY` for ISO-8601 timestamps, including OCC's `+0000` offsets.
/// Anything unparseable is returned unchanged.
pub fn format_date(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map(|dt| dt.format("%-m/%-d/%Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn status_line(status_display: &Option<String>, status: &Option<String>) -> Option<String> {
    text(status_display)
        .or(text(status))
        .map(|s| format!("Status: {s}"))
}

/// Name, street lines, `town postcode`, country; each part optional.
pub fn address_lines(addr: &Address) -> Vec<String> {
    let mut lines = Vec::new();
    if let (Some(first), Some(last)) = (text(&addr.first_name), text(&addr.last_name)) {
        lines.push(format!("{first} {last}"));
    }
    lines.extend(text(&addr.line1).map(str::to_string));
    lines.extend(text(&addr.line2).map(str::to_string));

    let locality = match (text(&addr.town), text(&addr.postal_code)) {
        (Some(town), Some(postal)) => format!("{town} {postal}"),
        (Some(town), None) => town.to_string(),
        (None, Some(postal)) => postal.to_string(),
        (None, None) => String::new(),
    };
    if !locality.is_empty() {
        lines.push(locality);
    }

    lines.extend(
        addr.country
            .as_ref()
            .and_then(|c| text(&c.name))
            .map(str::to_string),
    );
    lines
}

pub fn format_product(product: &Product) -> String {
    let mut lines = vec![format!(
        "**{}** ({})",
        or_default(&product.name, ""),
        or_default(&product.code, "")
    )];
    if let Some(description) = text(&product.description) {
        lines.push(format!("Description: {description}"));
    }
    if let Some(p) = price(&product.price) {
        lines.push(format!("Price: {p}"));
    }
    if let Some(stock) = &product.stock {
        lines.push(format!(
            "Stock: {} ({})",
            number_or_blank(&stock.stock_level),
            or_default(&stock.stock_level_status, "")
        ));
    }
    if let Some(url) = text(&product.url) {
        lines.push(format!("URL: {url}"));
    }
    lines.join("\n") + "\n---"
}

fn business_lines(
    po_number: &Option<String>,
    cost_center: Option<&super::models::CodeName>,
) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(po) = text(po_number) {
        lines.push(format!("PO Number: {po}"));
    }
    if let Some(cc) = cost_center {
        lines.push(format!(
            "Cost Center: {} ({})",
            or_default(&cc.name, ""),
            or_default(&cc.code, "")
        ));
    }
    lines
}

pub fn format_order_history(order: &OrderHistory) -> String {
    let mut lines = vec![format!("**Order {}**", or_default(&order.code, ""))];
    lines.extend(status_line(&order.status_display, &order.status));
    if let Some(placed) = text(&order.placed) {
        lines.push(format!("Placed: {}", format_date(placed)));
    }
    if let Some(total) = price(&order.total) {
        lines.push(format!("Total: {total}"));
    }
    lines.extend(business_lines(
        &order.purchase_order_number,
        order.cost_center.as_ref(),
    ));
    if let Some(unit) = &order.org_unit {
        lines.push(format!("Organization: {}", or_default(&unit.name, "")));
    }
    lines.join("\n") + "\n---"
}

fn total_line(with_tax: &Option<Price>, total: &Option<Price>) -> Option<String> {
    price(with_tax)
        .map(|p| format!("Total (incl. tax): {p}"))
        .or_else(|| price(total).map(|p| format!("Total: {p}")))
}

pub fn format_order_details(order: &Order) -> String {
    let mut lines = vec![format!("**Order {}**", or_default(&order.code, ""))];
    lines.extend(status_line(&order.status_display, &order.status));
    if let Some(placed) = text(&order.placed) {
        lines.push(format!("Placed: {}", format_date(placed)));
    }
    lines.push("**Pricing:**".to_string());
    if let Some(p) = price(&order.sub_total) {
        lines.push(format!("Subtotal: {p}"));
    }
    if let Some(p) = price(&order.delivery_cost) {
        lines.push(format!("Delivery: {p}"));
    }
    if let Some(p) = price(&order.total_tax) {
        lines.push(format!("Tax: {p}"));
    }
    lines.extend(total_line(&order.total_price_with_tax, &order.total_price));

    if let Some(mode) = &order.delivery_mode {
        lines.push("**Delivery:**".to_string());
        lines.push(format!("Mode: {}", or_default(&mode.name, "")));
        if let Some(addr) = &order.delivery_address {
            lines.push(format!("Address: {}", address_lines(addr).join(", ")));
        }
        lines.push(String::new());
    }

    let mut business = business_lines(&order.purchase_order_number, order.cost_center.as_ref());
    if let Some(unit) = &order.org_unit {
        business.push(format!("Organization: {}", or_default(&unit.name, "")));
    }
    if !business.is_empty() {
        lines.push("**Business Info:**".to_string());
        lines.extend(business);
        lines.push(String::new());
    }

    if let Some(entries) = order.entries.as_ref().filter(|e| !e.is_empty()) {
        lines.push("**Items:**".to_string());
        for (i, entry) in entries.iter().enumerate() {
            let product = entry.product.clone().unwrap_or_default();
            lines.push(format!(
                "{}. {} ({})",
                i + 1,
                or_default(&product.name, "Product"),
                or_default(&product.code, "N/A")
            ));
            lines.push(format!("   Quantity: {}", number_or_blank(&entry.quantity)));
            if let Some(p) = price(&entry.total_price) {
                lines.push(format!("   Price: {p}"));
            }
            if let Some(mode) = &entry.delivery_mode {
                lines.push(format!("   Delivery: {}", or_default(&mode.name, "")));
            }
        }
    }

    lines.join("\n")
}

pub fn format_cart_entry(entry: &Entry, index: usize) -> String {
    let product = entry.product.clone().unwrap_or_default();
    let mut lines = vec![
        format!(
            "{}. **{}** ({})",
            index + 1,
            or_default(&product.name, "Product"),
            or_default(&product.code, "N/A")
        ),
        format!("   Quantity: {}", number_or_blank(&entry.quantity)),
    ];
    if let Some(p) = price(&entry.base_price) {
        lines.push(format!("   Unit Price: {p}"));
    }
    if let Some(p) = price(&entry.total_price) {
        lines.push(format!("   Total: {p}"));
    }
    if let Some(mode) = &entry.delivery_mode {
        lines.push(format!("   Delivery: {}", or_default(&mode.name, "")));
    }
    if let Some(pos) = &entry.delivery_point_of_service {
        lines.push(format!("   Pickup: {}", pos.label()));
    }
    lines.join("\n")
}

pub fn format_cart(cart: &Cart) -> String {
    let mut lines = vec![format!("**Cart {}**", or_default(&cart.code, ""))];
    if let Some(user) = &cart.user {
        lines.push(format!(
            "Customer: {} ({})",
            or_default(&user.name, ""),
            or_default(&user.uid, "")
        ));
    }
    lines.push("**Summary:**".to_string());
    if let Some(n) = count(&cart.total_items) {
        lines.push(format!("Total Items: {n}"));
    }
    if let Some(n) = count(&cart.total_unit_count) {
        lines.push(format!("Total Units: {n}"));
    }
    if let Some(p) = price(&cart.sub_total) {
        lines.push(format!("Subtotal: {p}"));
    }
    if let Some(p) = price(&cart.delivery_cost) {
        lines.push(format!("Delivery: {p}"));
    }
    if let Some(p) = price(&cart.total_tax) {
        lines.push(format!("Tax: {p}"));
    }
    lines.extend(total_line(&cart.total_price_with_tax, &cart.total_price));

    if let Some(mode) = &cart.delivery_mode {
        lines.push("**Delivery Method:**".to_string());
        lines.push(delivery_mode_title(mode));
        if let Some(cost) = price(&mode.delivery_cost) {
            lines.push(format!("Cost: {cost}"));
        }
        lines.push(String::new());
    }

    if let Some(addr) = &cart.delivery_address {
        lines.push("**Delivery Address:**".to_string());
        lines.push(address_lines(addr).join(", "));
        if let Some(phone) = text(&addr.phone) {
            lines.push(format!("Phone: {phone}"));
        }
        lines.push(String::new());
    }

    if let Some(payment) = &cart.payment_info {
        lines.push("**Payment Method:**".to_string());
        if let (Some(card_type), Some(number)) = (&payment.card_type, text(&payment.card_number)) {
            let skip = number.chars().count().saturating_sub(4);
            let last4: String = number.chars().skip(skip).collect();
            lines.push(format!(
                "{} ending in {last4}",
                or_default(&card_type.name, "")
            ));
        }
        if let Some(holder) = text(&payment.account_holder_name) {
            lines.push(format!("Cardholder: {holder}"));
        }
        if let (Some(month), Some(year)) = (text(&payment.expiry_month), text(&payment.expiry_year))
        {
            lines.push(format!("Expires: {month}/{year}"));
        }
        lines.push(String::new());
    }

    let business = business_lines(&cart.purchase_order_number, cart.cost_center.as_ref());
    if !business.is_empty() {
        lines.push("**Business Info:**".to_string());
        lines.extend(business);
        lines.push(String::new());
    }

    if let Some(entries) = cart.entries.as_ref().filter(|e| !e.is_empty()) {
        lines.push("**Items:**".to_string());
        lines.extend(
            entries
                .iter()
                .enumerate()
                .map(|(i, entry)| format_cart_entry(entry, i)),
        );
        lines.push(String::new());
    }

    if let Some(promotions) = cart
        .applied_order_promotions
        .as_ref()
        .filter(|p| !p.is_empty())
    {
        lines.push("**Applied Promotions:**".to_string());
        for promo in promotions {
            let promotion = promo.promotion.clone().unwrap_or_default();
            let title = text(&promotion.title)
                .or(text(&promotion.code))
                .unwrap_or("Promotion");
            lines.push(format!(
                "- {title}: {}",
                or_default(&promo.description, "Discount applied")
            ));
        }
        lines.push(String::new());
    }

    if let Some(vouchers) = cart.applied_vouchers.as_ref().filter(|v| !v.is_empty()) {
        lines.push("**Applied Vouchers:**".to_string());
        for voucher in vouchers {
            let label = text(&voucher.name)
                .or(text(&voucher.code))
                .unwrap_or_default();
            let amount = count(&voucher.value)
                .map(|value| {
                    let iso = voucher
                        .currency
                        .as_ref()
                        .and_then(|c| text(&c.isocode))
                        .unwrap_or_default();
                    format!(" ({iso} {value})")
                })
                .unwrap_or_default();
            lines.push(format!("- {label}{amount}"));
        }
        lines.push(String::new());
    }

    if let Some(messages) = cart.messages.as_ref().filter(|m| !m.is_empty()) {
        lines.push("**Messages:**".to_string());
        for msg in messages {
            lines.push(format!(
                "- {}: {}",
                or_default(&msg.kind, "info").to_uppercase(),
                or_default(&msg.message, "")
            ));
        }
    }

    lines.join("\n")
}

pub fn format_b2b_cart(b2b: &B2BCart) -> String {
    let cart = &b2b.cart;
    let mut lines = vec![format!("**B2B Cart {}**", or_default(&cart.code, ""))];
    if let Some(name) = text(&b2b.name) {
        lines.push(format!("Name: {name}"));
    }
    if let Some(total) = price(&cart.total_price_with_tax) {
        lines.push(format!("Total: {total}"));
    }
    if let Some(n) = count(&cart.total_items) {
        lines.push(format!("Items: {n}"));
    }
    lines.extend(business_lines(&None, cart.cost_center.as_ref()));
    if let Some(customer) = &b2b.org_customer {
        lines.push(format!(
            "Organization User: {} ({})",
            or_default(&customer.name, ""),
            or_default(&customer.uid, "")
        ));
        if let Some(unit) = &customer.org_unit {
            lines.push(format!("Organization Unit: {}", or_default(&unit.name, "")));
        }
    }
    if let Some(payment_type) = &b2b.payment_type {
        lines.push(format!(
            "Payment Type: {}",
            or_default(&payment_type.display_name, "")
        ));
    }
    if let Some(po) = text(&cart.purchase_order_number) {
        lines.push(format!("PO Number: {po}"));
    }
    if let Some(created) = text(&b2b.created) {
        lines.push(format!("Created: {}", format_date(created)));
    }

    if let Some(entries) = cart.entries.as_ref().filter(|e| !e.is_empty()) {
        lines.push(String::new());
        lines.push("**Cart Items:**".to_string());
        lines.extend(
            entries
                .iter()
                .enumerate()
                .map(|(i, entry)| format_cart_entry(entry, i)),
        );
    }

    lines.join("\n")
}

pub fn format_b2b_order(b2b: &B2BOrder) -> String {
    let order = &b2b.order;
    let mut lines = vec![
        "**B2B Order Placed Successfully**".to_string(),
        format!("Order Code: {}", or_default(&order.code, "")),
    ];
    if let Some(status) = text(&order.status) {
        lines.push(format!("Status: {status}"));
    }
    if let Some(created) = text(&b2b.created) {
        lines.push(format!("Created: {}", format_date(created)));
    }
    if let Some(total) = price(&order.total_price_with_tax) {
        lines.push(format!("Total: {total}"));
    }
    lines.extend(business_lines(&None, order.cost_center.as_ref()));
    if let Some(unit) = &order.org_unit {
        lines.push(format!("Organization Unit: {}", or_default(&unit.name, "")));
    }
    if let Some(customer) = &b2b.org_customer {
        lines.push(format!(
            "Customer: {} ({})",
            or_default(&customer.name, ""),
            or_default(&customer.uid, "")
        ));
    }
    if let Some(po) = text(&order.purchase_order_number) {
        lines.push(format!("PO Number: {po}"));
    }
    if let Some(quote) = text(&b2b.sap_quote_code) {
        lines.push(format!("Quote Code: {quote}"));
    }
    lines.join("\n")
}

fn delivery_mode_title(mode: &DeliveryMode) -> String {
    match text(&mode.description) {
        Some(description) => format!("{} - {description}", or_default(&mode.name, "")),
        None => or_default(&mode.name, "").to_string(),
    }
}

/// Numbered list used by `get-delivery-modes`.
pub fn format_delivery_modes(modes: &[DeliveryMode]) -> String {
    let mut out = String::from("Available delivery modes:\n\n");
    for (i, mode) in modes.iter().enumerate() {
        out.push_str(&format!(
            "{}. **{}** ({})\n",
            i + 1,
            or_default(&mode.name, ""),
            or_default(&mode.code, "")
        ));
        if let Some(description) = text(&mode.description) {
            out.push_str(&format!("   {description}\n"));
        }
        if let Some(cost) = price(&mode.delivery_cost) {
            out.push_str(&format!("   Cost: {cost}\n"));
        }
        out.push('\n');
    }
    out
}
