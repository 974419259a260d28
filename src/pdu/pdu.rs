use std::collections::HashMap;
use std::convert::TryFrom;
use std::io;
use std::io::Read;

use crate::pdu::formats::{Integer4, WriteStream};
use crate::pdu::operations::bind_receiver::BIND_RECEIVER;
use crate::pdu::operations::bind_receiver_resp::BIND_RECEIVER_RESP;
use crate::pdu::operations::bind_transceiver::BIND_TRANSCEIVER;
use crate::pdu::operations::bind_transceiver_resp::BIND_TRANSCEIVER_RESP;
use crate::pdu::operations::bind_transmitter::BIND_TRANSMITTER;
use crate::pdu::operations::bind_transmitter_resp::BIND_TRANSMITTER_RESP;
use crate::pdu::operations::deliver_sm::DELIVER_SM;
use crate::pdu::operations::deliver_sm_resp::DELIVER_SM_RESP;
use crate::pdu::operations::enquire_link::ENQUIRE_LINK;
use crate::pdu::operations::enquire_link_resp::ENQUIRE_LINK_RESP;
use crate::pdu::operations::generic_nack::GENERIC_NACK;
use crate::pdu::operations::submit_sm::SUBMIT_SM;
use crate::pdu::operations::submit_sm_resp::SUBMIT_SM_RESP;
use crate::pdu::operations::unbind::UNBIND;
use crate::pdu::operations::unbind_resp::UNBIND_RESP;
use crate::pdu::validate_command_length::validate_command_length;
use crate::pdu::{
    check, BindReceiverPdu, BindReceiverRespPdu, BindTransceiverPdu,
    BindTransceiverRespPdu, BindTransmitterPdu, BindTransmitterRespPdu,
    CheckError, CheckOutcome, DeliverSmPdu, DeliverSmRespPdu, EnquireLinkPdu,
    EnquireLinkRespPdu, GenericNackPdu, PduParseError, PduParseErrorBody,
    SubmitSmPdu, SubmitSmRespPdu, UnbindPdu, UnbindRespPdu,
};

const HEADER_LENGTH: usize = 16;

lazy_static! {
    static ref COMMAND_NAMES: HashMap<u32, &'static str> = {
        let mut names = HashMap::new();
        names.insert(BIND_RECEIVER, "bind_receiver");
        names.insert(BIND_RECEIVER_RESP, "bind_receiver_resp");
        names.insert(BIND_TRANSCEIVER, "bind_transceiver");
        names.insert(BIND_TRANSCEIVER_RESP, "bind_transceiver_resp");
        names.insert(BIND_TRANSMITTER, "bind_transmitter");
        names.insert(BIND_TRANSMITTER_RESP, "bind_transmitter_resp");
        names.insert(DELIVER_SM, "deliver_sm");
        names.insert(DELIVER_SM_RESP, "deliver_sm_resp");
        names.insert(ENQUIRE_LINK, "enquire_link");
        names.insert(ENQUIRE_LINK_RESP, "enquire_link_resp");
        names.insert(GENERIC_NACK, "generic_nack");
        names.insert(SUBMIT_SM, "submit_sm");
        names.insert(SUBMIT_SM_RESP, "submit_sm_resp");
        names.insert(UNBIND, "unbind");
        names.insert(UNBIND_RESP, "unbind_resp");
        names
    };
}

pub fn command_name(command_id: u32) -> &'static str {
    COMMAND_NAMES.get(&command_id).copied().unwrap_or("unknown")
}

#[derive(Debug, PartialEq)]
pub enum PduBody {
    BindReceiver(BindReceiverPdu),
    BindReceiverResp(BindReceiverRespPdu),
    BindTransceiver(BindTransceiverPdu),
    BindTransceiverResp(BindTransceiverRespPdu),
    BindTransmitter(BindTransmitterPdu),
    BindTransmitterResp(BindTransmitterRespPdu),
    DeliverSm(DeliverSmPdu),
    DeliverSmResp(DeliverSmRespPdu),
    EnquireLink(EnquireLinkPdu),
    EnquireLinkResp(EnquireLinkRespPdu),
    GenericNack(GenericNackPdu),
    SubmitSm(SubmitSmPdu),
    SubmitSmResp(SubmitSmRespPdu),
    Unbind(UnbindPdu),
    UnbindResp(UnbindRespPdu),
}

impl PduBody {
    pub fn command_id(&self) -> u32 {
        match self {
            PduBody::BindReceiver(_) => BIND_RECEIVER,
            PduBody::BindReceiverResp(_) => BIND_RECEIVER_RESP,
            PduBody::BindTransceiver(_) => BIND_TRANSCEIVER,
            PduBody::BindTransceiverResp(_) => BIND_TRANSCEIVER_RESP,
            PduBody::BindTransmitter(_) => BIND_TRANSMITTER,
            PduBody::BindTransmitterResp(_) => BIND_TRANSMITTER_RESP,
            PduBody::DeliverSm(_) => DELIVER_SM,
            PduBody::DeliverSmResp(_) => DELIVER_SM_RESP,
            PduBody::EnquireLink(_) => ENQUIRE_LINK,
            PduBody::EnquireLinkResp(_) => ENQUIRE_LINK_RESP,
            PduBody::GenericNack(_) => GENERIC_NACK,
            PduBody::SubmitSm(_) => SUBMIT_SM,
            PduBody::SubmitSmResp(_) => SUBMIT_SM_RESP,
            PduBody::Unbind(_) => UNBIND,
            PduBody::UnbindResp(_) => UNBIND_RESP,
        }
    }

    async fn write(&self, stream: &mut WriteStream) -> io::Result<()> {
        match self {
            PduBody::BindReceiver(pdu) => pdu.write(stream).await,
            PduBody::BindReceiverResp(pdu) => pdu.write(stream).await,
            PduBody::BindTransceiver(pdu) => pdu.write(stream).await,
            PduBody::BindTransceiverResp(pdu) => pdu.write(stream).await,
            PduBody::BindTransmitter(pdu) => pdu.write(stream).await,
            PduBody::BindTransmitterResp(pdu) => pdu.write(stream).await,
            PduBody::DeliverSm(pdu) => pdu.write(stream).await,
            PduBody::DeliverSmResp(pdu) => pdu.write(stream).await,
            PduBody::EnquireLink(pdu) => pdu.write(stream).await,
            PduBody::EnquireLinkResp(pdu) => pdu.write(stream).await,
            PduBody::GenericNack(pdu) => pdu.write(stream).await,
            PduBody::SubmitSm(pdu) => pdu.write(stream).await,
            PduBody::SubmitSmResp(pdu) => pdu.write(stream).await,
            PduBody::Unbind(pdu) => pdu.write(stream).await,
            PduBody::UnbindResp(pdu) => pdu.write(stream).await,
        }
    }

    fn parse(
        command_id: u32,
        command_status: u32,
        bytes: &mut dyn io::BufRead,
    ) -> Result<PduBody, PduParseError> {
        match command_id {
            BIND_RECEIVER => BindReceiverPdu::parse(bytes, command_status)
                .map(|p| p.into()),
            BIND_RECEIVER_RESP => {
                BindReceiverRespPdu::parse(bytes, command_status)
                    .map(|p| p.into())
            }
            BIND_TRANSCEIVER => {
                BindTransceiverPdu::parse(bytes, command_status)
                    .map(|p| p.into())
            }
            BIND_TRANSCEIVER_RESP => {
                BindTransceiverRespPdu::parse(bytes, command_status)
                    .map(|p| p.into())
            }
            BIND_TRANSMITTER => {
                BindTransmitterPdu::parse(bytes, command_status)
                    .map(|p| p.into())
            }
            BIND_TRANSMITTER_RESP => {
                BindTransmitterRespPdu::parse(bytes, command_status)
                    .map(|p| p.into())
            }
            DELIVER_SM => {
                DeliverSmPdu::parse(bytes, command_status).map(|p| p.into())
            }
            DELIVER_SM_RESP => DeliverSmRespPdu::parse(bytes, command_status)
                .map(|p| p.into()),
            ENQUIRE_LINK => {
                EnquireLinkPdu::parse(bytes, command_status).map(|p| p.into())
            }
            ENQUIRE_LINK_RESP => {
                EnquireLinkRespPdu::parse(bytes, command_status)
                    .map(|p| p.into())
            }
            GENERIC_NACK => {
                GenericNackPdu::parse(bytes, command_status).map(|p| p.into())
            }
            SUBMIT_SM => {
                SubmitSmPdu::parse(bytes, command_status).map(|p| p.into())
            }
            SUBMIT_SM_RESP => SubmitSmRespPdu::parse(bytes, command_status)
                .map(|p| p.into()),
            UNBIND => {
                UnbindPdu::parse(bytes, command_status).map(|p| p.into())
            }
            UNBIND_RESP => {
                UnbindRespPdu::parse(bytes, command_status).map(|p| p.into())
            }
            _ => Err(PduParseError::for_unknown_command_id()),
        }
    }
}

impl From<BindReceiverPdu> for PduBody {
    fn from(pdu: BindReceiverPdu) -> Self {
        PduBody::BindReceiver(pdu)
    }
}

impl From<BindReceiverRespPdu> for PduBody {
    fn from(pdu: BindReceiverRespPdu) -> Self {
        PduBody::BindReceiverResp(pdu)
    }
}

impl From<BindTransceiverPdu> for PduBody {
    fn from(pdu: BindTransceiverPdu) -> Self {
        PduBody::BindTransceiver(pdu)
    }
}

impl From<BindTransceiverRespPdu> for PduBody {
    fn from(pdu: BindTransceiverRespPdu) -> Self {
        PduBody::BindTransceiverResp(pdu)
    }
}

impl From<BindTransmitterPdu> for PduBody {
    fn from(pdu: BindTransmitterPdu) -> Self {
        PduBody::BindTransmitter(pdu)
    }
}

impl From<BindTransmitterRespPdu> for PduBody {
    fn from(pdu: BindTransmitterRespPdu) -> Self {
        PduBody::BindTransmitterResp(pdu)
    }
}

impl From<DeliverSmPdu> for PduBody {
    fn from(pdu: DeliverSmPdu) -> Self {
        PduBody::DeliverSm(pdu)
    }
}

impl From<DeliverSmRespPdu> for PduBody {
    fn from(pdu: DeliverSmRespPdu) -> Self {
        PduBody::DeliverSmResp(pdu)
    }
}

impl From<EnquireLinkPdu> for PduBody {
    fn from(pdu: EnquireLinkPdu) -> Self {
        PduBody::EnquireLink(pdu)
    }
}

impl From<EnquireLinkRespPdu> for PduBody {
    fn from(pdu: EnquireLinkRespPdu) -> Self {
        PduBody::EnquireLinkResp(pdu)
    }
}

impl From<GenericNackPdu> for PduBody {
    fn from(pdu: GenericNackPdu) -> Self {
        PduBody::GenericNack(pdu)
    }
}

impl From<SubmitSmPdu> for PduBody {
    fn from(pdu: SubmitSmPdu) -> Self {
        PduBody::SubmitSm(pdu)
    }
}

impl From<SubmitSmRespPdu> for PduBody {
    fn from(pdu: SubmitSmRespPdu) -> Self {
        PduBody::SubmitSmResp(pdu)
    }
}

impl From<UnbindPdu> for PduBody {
    fn from(pdu: UnbindPdu) -> Self {
        PduBody::Unbind(pdu)
    }
}

impl From<UnbindRespPdu> for PduBody {
    fn from(pdu: UnbindRespPdu) -> Self {
        PduBody::UnbindResp(pdu)
    }
}

/// One SMPP PDU: the header fields that apply to every operation, plus a
/// typed body.  command_length is not stored; it is derived on write.
#[derive(Debug, PartialEq)]
pub struct Pdu {
    command_status: Integer4,
    pub sequence_number: Integer4,
    body: PduBody,
}

impl Pdu {
    pub fn new(
        command_status: u32,
        sequence_number: u32,
        body: PduBody,
    ) -> Result<Self, PduParseError> {
        // Requests always carry a zero status; only responses (including
        // generic_nack) may report an error.
        if command_status != 0 && body.command_id() & 0x80000000 == 0 {
            return Err(PduParseError::new(
                PduParseErrorBody::StatusIsNotZero(command_status),
            )
            .into_with_command_id(body.command_id()));
        }
        Ok(Self {
            command_status: Integer4::new(command_status),
            sequence_number: Integer4::new(sequence_number),
            body,
        })
    }

    pub fn parse(bytes: &mut dyn io::BufRead) -> Result<Pdu, PduParseError> {
        let command_length = Integer4::read(bytes)?;
        validate_command_length(&command_length)?;

        let mut bytes = bytes
            .take(u64::try_from(command_length.value - 4).unwrap_or(0));
        let command_id = Integer4::read(&mut bytes)?;
        let command_status =
            Integer4::read(&mut bytes).map_err(|e| {
                PduParseError::from(e)
                    .into_with_command_id(command_id.value)
            })?;
        let sequence_number =
            Integer4::read(&mut bytes).map_err(|e| {
                PduParseError::from(e)
                    .into_with_command_id(command_id.value)
            })?;

        let body = PduBody::parse(
            command_id.value,
            command_status.value,
            &mut bytes,
        )
        .map_err(|e| {
            e.into_with_command_id(command_id.value)
                .into_with_sequence_number(sequence_number.value)
        })?;

        // Trailing bytes after the body are tolerated (forward-compat);
        // drain them so the reader is left at the frame boundary.
        io::copy(&mut bytes, &mut io::sink()).map_err(|e| {
            PduParseError::from(e)
                .into_with_command_id(command_id.value)
                .into_with_sequence_number(sequence_number.value)
        })?;

        Ok(Pdu {
            command_status,
            sequence_number,
            body,
        })
    }

    pub fn check(
        bytes: &mut dyn io::BufRead,
    ) -> Result<CheckOutcome, CheckError> {
        check::check(bytes)
    }

    pub async fn write(&self, stream: &mut WriteStream) -> io::Result<()> {
        let mut body: Vec<u8> = Vec::new();
        self.body.write(&mut body).await?;

        Integer4::new((HEADER_LENGTH + body.len()) as u32)
            .write(stream)
            .await?;
        Integer4::new(self.body.command_id()).write(stream).await?;
        self.command_status.write(stream).await?;
        self.sequence_number.write(stream).await?;
        tokio::io::AsyncWriteExt::write_all(stream, &body).await
    }

    pub fn command_id(&self) -> u32 {
        self.body.command_id()
    }

    pub fn command_status(&self) -> u32 {
        self.command_status.value
    }

    pub fn command_name(&self) -> &'static str {
        command_name(self.body.command_id())
    }

    pub fn body(&self) -> &PduBody {
        &self.body
    }
}
