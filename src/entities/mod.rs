pub mod auditorium;
pub mod bundle;
pub mod bundle_item;
pub mod cart_item;
pub mod code_puzzle;
pub mod coupon;
pub mod customer;
pub mod customer_showing;
pub mod delivery;
pub mod delivery_item;
pub mod driver;
pub mod movie;
pub mod movie_showing;
pub mod ngo_donation;
pub mod payment_method;
pub mod product;
pub mod seat;
pub mod staff;
pub mod theatre;

pub use bundle::{Entity as Bundle, Model as BundleModel};
pub use bundle_item::{Entity as BundleItem, Model as BundleItemModel};
pub use cart_item::{CartLine, Entity as CartItem, Model as CartItemModel, MAX_LINE_QUANTITY};
pub use code_puzzle::{Entity as CodePuzzle, Model as CodePuzzleModel};
pub use coupon::{Entity as Coupon, Model as CouponModel};
pub use customer::{Entity as Customer, Model as CustomerModel};
pub use customer_showing::{Entity as CustomerShowing, Model as CustomerShowingModel};
pub use delivery::{DeliveryStatus, Entity as Delivery, Model as DeliveryModel, PaymentStatus};
pub use delivery_item::{Entity as DeliveryItem, Model as DeliveryItemModel};
pub use driver::{DriverStatus, Entity as Driver, Model as DriverModel};
pub use ngo_donation::{Entity as NgoDonation, Model as NgoDonationModel};
pub use payment_method::{Entity as PaymentMethod, Model as PaymentMethodModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use staff::{Entity as Staff, Model as StaffModel, StaffRole};
