use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{AddToCartRequest, CartSummary, CartSyncData, SetQuantityRequest, Shortfall, UpdateQuantityRequest},
        orders::{CheckoutRequest, OrderList},
        payment::{CreateIntentRequest, IntentData, SettlementData, VerifyCallbackRequest},
        products::ProductList,
    },
    models::{Cart, CartLine, Order, Product, ShippingSnapshot, VariantGroup},
    response::{ApiResponse, Meta},
    routes::{cart, health, health::HealthData, orders, params, payment, products as product_routes},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        product_routes::list_products,
        product_routes::get_product,
        cart::get_cart,
        cart::sync_cart,
        cart::add_to_cart,
        cart::update_quantity,
        cart::set_quantity,
        cart::remove_from_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        payment::create_intent,
        payment::verify_callback
    ),
    components(
        schemas(
            Product,
            VariantGroup,
            Cart,
            CartLine,
            ShippingSnapshot,
            Order,
            AddToCartRequest,
            UpdateQuantityRequest,
            SetQuantityRequest,
            CartSummary,
            Shortfall,
            CartSyncData,
            CheckoutRequest,
            OrderList,
            CreateIntentRequest,
            IntentData,
            VerifyCallbackRequest,
            SettlementData,
            params::ProductQuery,
            Meta,
            HealthData,
            ApiResponse<HealthData>,
            ApiResponse<CartSummary>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Cart>,
            ApiResponse<CartSyncData>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<IntentData>,
            ApiResponse<SettlementData>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog read endpoints"),
        (name = "Cart", description = "Cart and inventory reconciliation endpoints"),
        (name = "Orders", description = "Checkout endpoints"),
        (name = "Payment", description = "Payment gateway endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
