pub mod delivery_report;
pub mod smsc;
pub mod smsc_config;
pub mod smsc_logic;

pub use crate::pdu::data::bind_data::BindData;
pub use delivery_report::{format_delivery_receipt, PendingDeliveryReport};
pub use smsc::{run, Smsc};
pub use smsc_config::SmscConfig;
pub use smsc_logic::{AllowAllLogic, BindError, SmscLogic, SubmitSmError};
