// Entity Models
//
// Each entity has a stable identity (id) that NEVER changes; everything else
// is a value that can be edited (partners) or only deleted (withdrawals).

pub mod partner;
pub mod withdrawal;
pub mod records;

pub use partner::{Partner, PartnerInput, ShareMethod};
pub use withdrawal::{ReceiptImage, Withdrawal, WithdrawalDraft, DATE_FORMAT};
pub use records::{Employee, Expense, Reservation, ReservationStatus};
