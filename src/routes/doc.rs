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
        account::{NewsletterPreferenceRequest, NewsletterPreferenceResponse, ProfileResponse, UpdateProfileRequest},
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartActionResponse, CartCount, CartLine, CartProduct, CartView, RemoveCartItemRequest, UpdateCartItemRequest},
        catalog::{
            CategoryDetail, CategoryList, CreateCategoryRequest, CreateProductRequest, HomePage,
            ProductDetail, ProductList, SearchResults, UpdateCategoryRequest, UpdateProductRequest,
        },
        contact::{ContactRequest, ContactResponse, NewsletterSubscribeRequest, NewsletterSubscribeResponse},
        orders::{CheckoutInitial, CheckoutPage, CheckoutRequest, CheckoutResult, OrderList, OrderWithItems, ReorderResponse},
        reviews::ReviewRequest,
        wishlist::{ToggleWishlistRequest, WishlistStatus, WishlistToggleResponse, WishlistView},
    },
    entity::{
        contacts::ContactSubject,
        orders::{OrderStatus, PaymentMethod, PaymentStatus},
        products::Gender,
    },
    models::{Category, Order, OrderItem, Product, Review, SiteSettings, User},
    response::{ApiResponse, Meta},
    routes::{account, admin, auth, cart, catalog, checkout, contact, health, orders, params, wishlist},
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
        auth::register,
        auth::login,
        account::profile,
        account::update_profile,
        account::newsletter,
        account::delete_account,
        catalog::home,
        catalog::list_products,
        catalog::product_detail,
        catalog::submit_review,
        catalog::list_categories,
        catalog::category_detail,
        catalog::search,
        catalog::site_settings,
        cart::view_cart,
        cart::cart_count,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_cart_item,
        wishlist::view_wishlist,
        wishlist::toggle,
        wishlist::check,
        checkout::checkout_page,
        checkout::place_order,
        checkout::confirmation,
        orders::list_orders,
        orders::get_order,
        orders::reorder,
        orders::cancel_order,
        contact::contact,
        contact::subscribe,
        admin::create_category,
        admin::update_category,
        admin::create_product,
        admin::update_product,
        admin::deactivate_product,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_low_stock,
        admin::adjust_inventory,
        admin::update_settings
    ),
    components(
        schemas(
            User,
            Category,
            Product,
            Review,
            Order,
            OrderItem,
            SiteSettings,
            Gender,
            OrderStatus,
            PaymentStatus,
            PaymentMethod,
            ContactSubject,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            ProfileResponse,
            UpdateProfileRequest,
            NewsletterPreferenceRequest,
            NewsletterPreferenceResponse,
            AddToCartRequest,
            UpdateCartItemRequest,
            RemoveCartItemRequest,
            CartActionResponse,
            CartCount,
            CartProduct,
            CartLine,
            CartView,
            ToggleWishlistRequest,
            WishlistToggleResponse,
            WishlistStatus,
            WishlistView,
            ReviewRequest,
            CheckoutRequest,
            CheckoutInitial,
            CheckoutPage,
            CheckoutResult,
            OrderList,
            OrderWithItems,
            ReorderResponse,
            ContactRequest,
            ContactResponse,
            NewsletterSubscribeRequest,
            NewsletterSubscribeResponse,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CategoryList,
            CategoryDetail,
            ProductDetail,
            HomePage,
            SearchResults,
            admin::UpdateOrderStatusRequest,
            admin::InventoryAdjustRequest,
            admin::LowStockQuery,
            admin::UpdateSettingsRequest,
            params::Pagination,
            params::ProductQuery,
            params::ProductSort,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<CheckoutResult>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Account", description = "Profile and account settings"),
        (name = "Catalog", description = "Products, categories and search"),
        (name = "Reviews", description = "Product reviews"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Wishlist", description = "Saved products"),
        (name = "Checkout", description = "Order placement"),
        (name = "Orders", description = "Order history"),
        (name = "Site", description = "Contact form and newsletter"),
        (name = "Admin", description = "Staff endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
