/// https://smpp.org/SMPP_v3_4_Issue1_2.pdf section 5.2.19
///
/// The data_coding values this server produces or interprets.  Values on
/// the wire are carried as raw bytes: an unrecognised coding never fails
/// decoding, it simply falls through to the default text handling.
#[derive(FromPrimitive, Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
pub enum DataCoding {
    Default = 0x00,
    Ia5 = 0x01,
    Binary8Bit = 0x02,
    Latin1 = 0x03,
    Binary = 0x04,
    Ucs2 = 0x08,
}

impl From<DataCoding> for u8 {
    fn from(data_coding: DataCoding) -> u8 {
        data_coding as u8
    }
}
