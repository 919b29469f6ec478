pub mod gateway;
pub mod razorpay;
pub mod signature;

pub use gateway::{GatewayError, NewOrder, OrderGateway, PaymentOrder};
pub use razorpay::RazorpayGateway;
pub use signature::{PaymentVerifier, SignatureError};
