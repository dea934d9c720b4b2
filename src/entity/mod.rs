pub mod audit_logs;
pub mod cart_items;
pub mod carts;
pub mod categories;
pub mod contacts;
pub mod newsletter_subscribers;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod site_settings;
pub mod users;
pub mod wishlist_items;
pub mod wishlists;

pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use categories::Entity as Categories;
pub use contacts::Entity as Contacts;
pub use newsletter_subscribers::Entity as NewsletterSubscribers;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use reviews::Entity as Reviews;
pub use site_settings::Entity as SiteSettings;
pub use users::Entity as Users;
pub use wishlist_items::Entity as WishlistItems;
pub use wishlists::Entity as Wishlists;
