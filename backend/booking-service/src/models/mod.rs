pub mod booking;
pub mod category;
pub mod hotel;
pub mod response;
pub mod review;
pub mod user;

pub use booking::{
    BookedCategory, Booking, BookingDetail, BookingReceipt, BookingStatus, NewBooking, Payment,
    ReservedRange,
};
pub use category::{
    Category, CategoryAvailability, CategoryDetail, CategoryPatch, NewCategory, Room,
};
pub use hotel::{Hotel, HotelBookingCount, HotelPatch, HotelWithImages, Image, NewHotel};
pub use response::{ApiResponse, Page, PageQuery};
pub use review::{Reply, Review, ReviewWithAuthor};
pub use user::{Role, User};
