//! The storefront tools offered to the model.
//!
//! Each tool calls the backend once and renders a short text summary.
//! Backend failures come back as `❌` text so the model can explain them.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::storefront::{ProductQuery, StorefrontClient};
use crate::tool::{CommerceTool, ToolRegistry, ToolReply};

/// Most products listed in one search reply.
pub const SEARCH_DISPLAY_LIMIT: usize = 5;

/// Register every storefront tool against one client.
pub fn storefront_registry(client: Arc<StorefrontClient>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(ProductBySku::new(Arc::clone(&client)));
    registry.register(AllCategories::new(Arc::clone(&client)));
    registry.register(SearchProducts::new(client));
    registry
}

/// Render a JSON field the way a template string would. Strings print bare
/// and absent fields print `undefined`.
fn field(value: &Value, key: &str) -> String {
    match value.get(key) {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

// ─── get_product_by_sku ──────────────────────────────────────────────────────

/// Arguments for [`ProductBySku`].
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ProductBySkuArgs {
    /// The SKU of the product
    pub sku: String,
}

/// Look up one product by SKU.
pub struct ProductBySku {
    client: Arc<StorefrontClient>,
}

impl ProductBySku {
    /// Create the tool.
    pub fn new(client: Arc<StorefrontClient>) -> Self {
        Self { client }
    }
}

impl CommerceTool for ProductBySku {
    const NAME: &'static str = "get_product_by_sku";
    const DESCRIPTION: &'static str = "Fetch a product's details by SKU";
    type Args = ProductBySkuArgs;

    async fn call(&self, args: ProductBySkuArgs) -> ToolReply {
        match self.client.product_detail(&args.sku).await {
            Ok(product) => ToolReply::text(format!(
                "🛍️ Product: {}\n💰 Price: ₹{}\n📦 In stock: {}",
                field(&product, "name"),
                field(&product, "price"),
                field(&product, "quantity"),
            )),
            Err(e) => {
                tracing::warn!(sku = %args.sku, error = %e, "product lookup failed");
                ToolReply::text(format!(
                    "❌ Failed to fetch product with SKU \"{}\": {e}",
                    args.sku
                ))
            }
        }
    }
}

// ─── get_all_category ────────────────────────────────────────────────────────

/// `get_all_category` takes no arguments.
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct AllCategoriesArgs {}

/// List every category.
pub struct AllCategories {
    client: Arc<StorefrontClient>,
}

impl AllCategories {
    /// Create the tool.
    pub fn new(client: Arc<StorefrontClient>) -> Self {
        Self { client }
    }
}

impl CommerceTool for AllCategories {
    const NAME: &'static str = "get_all_category";
    const DESCRIPTION: &'static str = "Fetch All Categories";
    type Args = AllCategoriesArgs;

    async fn call(&self, _args: AllCategoriesArgs) -> ToolReply {
        let categories = match self.client.categories().await {
            Ok(categories) => categories,
            Err(e) => {
                tracing::warn!(error = %e, "category listing failed");
                return ToolReply::text(format!("❌ Failed to fetch Category {e}"));
            }
        };

        let listing = categories
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|cat| {
                format!(
                    "🛍️ Category: {}\n💰 Category Slug: ₹{}\n📦",
                    field(cat, "name"),
                    field(cat, "categorySlug"),
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        ToolReply::with_metadata(
            format!("Found Categories:\n\n{listing}"),
            json!({ "data": categories }),
        )
    }
}

// ─── search_products ─────────────────────────────────────────────────────────

/// Arguments for [`SearchProducts`].
#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchProductsArgs {
    /// Search keyword
    pub keyword: String,
    /// Minimum price
    #[schemars(range(min = 0))]
    pub from_price: f64,
    /// Maximum price
    #[schemars(range(min = 0))]
    pub to_price: f64,
    /// Search By Category Slug
    #[serde(default)]
    pub category_slug: String,
    /// Set to 1 to fetch the latest arrivals within the filtered results. Set to 0 to disable this filter. Defaults to 0.
    #[serde(default)]
    pub latest_arrival: i64,
}

/// Keyword and price-range product search.
pub struct SearchProducts {
    client: Arc<StorefrontClient>,
}

impl SearchProducts {
    /// Create the tool.
    pub fn new(client: Arc<StorefrontClient>) -> Self {
        Self { client }
    }
}

impl CommerceTool for SearchProducts {
    const NAME: &'static str = "search_products";
    const DESCRIPTION: &'static str = "Search for products by keyword and price range";
    type Args = SearchProductsArgs;

    async fn call(&self, args: SearchProductsArgs) -> ToolReply {
        // The backend has no category filter on this endpoint.
        if !args.category_slug.is_empty() {
            tracing::debug!(category = %args.category_slug, "category slug not forwarded");
        }
        let query = ProductQuery {
            keyword: args.keyword,
            from_price: args.from_price,
            to_price: args.to_price,
            latest_arrival: args.latest_arrival,
        };

        let products = match self.client.search_products(&query).await {
            Ok(products) => products,
            Err(e) => {
                tracing::warn!(keyword = %query.keyword, error = %e, "product search failed");
                return ToolReply::text(format!("❌ Error searching products: {e}"));
            }
        };

        let shown: Vec<Value> = products
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .take(SEARCH_DISPLAY_LIMIT)
            .cloned()
            .collect();

        if shown.is_empty() {
            return ToolReply::text("No products found.");
        }

        let listing = shown
            .iter()
            .map(|p| {
                format!(
                    "🛒 {}\nSKU: {}\nPrice: ₹{}\nStock: {}\n---",
                    field(p, "name"),
                    field(p, "sku"),
                    field(p, "price"),
                    field(p, "stock"),
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        ToolReply::with_metadata(
            format!("Found products:\n\n{listing}"),
            json!({ "data": shown }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::input_schema_for;

    #[test]
    fn field_renders_like_a_template() {
        let v = json!({"name": "Tee", "price": 499, "stock": null});
        assert_eq!(field(&v, "name"), "Tee");
        assert_eq!(field(&v, "price"), "499");
        assert_eq!(field(&v, "stock"), "null");
        assert_eq!(field(&v, "quantity"), "undefined");
    }

    #[test]
    fn search_schema_uses_wire_names() {
        let schema = input_schema_for::<SearchProductsArgs>();
        let props = &schema["properties"];
        assert!(props.get("fromPrice").is_some());
        assert!(props.get("latestArrival").is_some());
        assert_eq!(props["fromPrice"]["minimum"].as_f64(), Some(0.0));
        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&json!("keyword")));
        assert!(!required.contains(&json!("categorySlug")));
    }

    #[test]
    fn category_args_accept_empty_object() {
        serde_json::from_value::<AllCategoriesArgs>(json!({})).unwrap();
        let schema = input_schema_for::<AllCategoriesArgs>();
        assert_eq!(schema["type"], "object");
    }
}
