pub mod booking;
pub mod hotel;
pub mod package;
pub mod pricing;
pub mod quote;
pub mod ticket;

pub use booking::{Booking, BookingLine, BookingSummary, Payment, PaymentStatus};
pub use hotel::{AvailabilityWindow, BedType, Hotel, RoomRate};
pub use package::{HotelStay, Package};
pub use pricing::{
    ComponentKind, PassengerMix, PaxPrice, PriceBreakdown, PriceComponent, PricingEngine,
    PricingRules,
};
pub use quote::{quote_package, MissingComponent, PackageQuote};
pub use ticket::{Ticket, TripLeg};
