//! Domain types for the storefront.
//!
//! These types represent validated domain objects separate from database row
//! types. Repositories map rows into them; routes shape them into view models.

pub mod cart;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use cart::{Cart, CartItem, CartView, CompositeComponent};
pub use order::{Order, OrderItem, ShippingAddress};
pub use product::{Product, ProductImage, ProductVariant};
pub use session::{CurrentUser, Session};
pub use user::{FederatedIdentity, User};
