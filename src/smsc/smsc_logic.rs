use async_trait::async_trait;

use crate::pdu::data::bind_data::BindData;
use crate::pdu::PduStatus;

pub enum BindError {
    BindFailed,
    InternalError,
}

impl From<BindError> for PduStatus {
    fn from(e: BindError) -> PduStatus {
        match e {
            BindError::BindFailed => PduStatus::ESME_RBINDFAIL,
            BindError::InternalError => PduStatus::ESME_RSYSERR,
        }
    }
}

pub enum SubmitSmError {
    QueueFull,
    InternalError,
}

impl From<SubmitSmError> for PduStatus {
    fn from(e: SubmitSmError) -> PduStatus {
        match e {
            SubmitSmError::QueueFull => PduStatus::ESME_RMSGQFUL,
            SubmitSmError::InternalError => PduStatus::ESME_RSYSERR,
        }
    }
}

/// Pluggable credential check for binds.  The server consults this for
/// every bind_* request; when the default AllowAllLogic is installed,
/// every bind succeeds.
#[async_trait]
pub trait SmscLogic: Send + Sync {
    async fn bind(&self, bind_data: &BindData) -> Result<(), BindError>;
}

pub struct AllowAllLogic {}

#[async_trait]
impl SmscLogic for AllowAllLogic {
    async fn bind(&self, _bind_data: &BindData) -> Result<(), BindError> {
        Ok(())
    }
}
