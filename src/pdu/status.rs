/// https://smpp.org/SMPP_v3_4_Issue1_2.pdf section 5.1.3
/// The subset of command_status values this server sends or inspects.
#[allow(non_camel_case_types)]
#[derive(FromPrimitive, Debug, Clone, Copy, PartialEq)]
#[repr(u32)]
pub enum PduStatus {
    ESME_ROK = 0x00000000,
    ESME_RINVMSGLEN = 0x00000001,
    ESME_RINVCMDLEN = 0x00000002,
    ESME_RINVCMDID = 0x00000003,
    ESME_RINVBNDSTS = 0x00000004,
    ESME_RALYBND = 0x00000005,
    ESME_RSYSERR = 0x00000008,
    ESME_RINVSRCADR = 0x0000000A,
    ESME_RINVDSTADR = 0x0000000B,
    ESME_RINVMSGID = 0x0000000C,
    ESME_RBINDFAIL = 0x0000000D,
    ESME_RINVPASWD = 0x0000000E,
    ESME_RINVSYSID = 0x0000000F,
    ESME_RMSGQFUL = 0x00000014,
    ESME_RSUBMITFAIL = 0x00000045,
    ESME_RTHROTTLED = 0x00000058,
    ESME_RDELIVERYFAILURE = 0x000000FE,
    ESME_RUNKNOWNERR = 0x000000FF,
}
