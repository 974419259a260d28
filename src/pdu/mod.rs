mod check;
pub mod data;
mod data_coding;
mod esm_class;
pub mod formats;
mod operations;
mod pdu;
mod pduparseerror;
mod status;
mod validate_command_length;

pub use check::{CheckError, CheckOutcome};
pub use data_coding::DataCoding;
pub use esm_class::DeliverEsmClass;
pub use operations::bind_receiver::BindReceiverPdu;
pub use operations::bind_receiver_resp::BindReceiverRespPdu;
pub use operations::bind_transceiver::BindTransceiverPdu;
pub use operations::bind_transceiver_resp::BindTransceiverRespPdu;
pub use operations::bind_transmitter::BindTransmitterPdu;
pub use operations::bind_transmitter_resp::BindTransmitterRespPdu;
pub use operations::deliver_sm::DeliverSmPdu;
pub use operations::deliver_sm_resp::DeliverSmRespPdu;
pub use operations::enquire_link::EnquireLinkPdu;
pub use operations::enquire_link_resp::EnquireLinkRespPdu;
pub use operations::generic_nack::GenericNackPdu;
pub use operations::submit_sm::SubmitSmPdu;
pub use operations::submit_sm_resp::SubmitSmRespPdu;
pub use operations::unbind::UnbindPdu;
pub use operations::unbind_resp::UnbindRespPdu;
pub use pdu::{command_name, Pdu, PduBody};
pub use pduparseerror::{fld, PduParseError, PduParseErrorBody};
pub use status::PduStatus;
pub use validate_command_length::{
    CommandLengthError, MAX_PDU_LENGTH, MIN_PDU_LENGTH,
};
