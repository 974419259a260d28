/// https://smpp.org/SMPP_v3_4_Issue1_2.pdf section 5.2.12
///
/// esm_class values used on deliver_sm PDUs we originate.  The middle four
/// bits carry the message type; a delivery receipt sets bit 2.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeliverEsmClass {
    Default = 0b00000000,
    SmscDeliveryReceipt = 0b00000100,
}

impl From<DeliverEsmClass> for u8 {
    fn from(esm_class: DeliverEsmClass) -> u8 {
        esm_class as u8
    }
}
