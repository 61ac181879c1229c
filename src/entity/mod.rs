pub mod article;
pub mod card_entry;
pub mod config;
pub mod entry;
pub mod entry_card;
pub mod location;
pub mod offpeak_card;
pub mod offpick_card;
pub mod order;
pub mod order_item;
pub mod product;
pub mod user;
pub mod user_offpeak_card;
pub mod user_offpick_card;
pub mod user_voucher;
pub mod users_credits_history;
pub mod video_processed;
pub mod voucher;
pub mod voucher_transaction;

pub use user::UserType;
pub use video_processed::VideoStatus;
pub use voucher::VoucherType;
