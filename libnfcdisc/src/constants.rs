// libnfcdisc/src/constants.rs
//! Common protocol constants used across the crate

/// Maximum number of devices kept in the discovery device list
pub const MAX_DEVICES: usize = 5;

/// Raw RF exchange buffer length in bytes
pub const RF_BUF_LEN: usize = 258;

/// Largest APDU the ISO-DEP bridge accepts or returns
pub const ISODEP_APDU_MAX_LEN: usize = 1024;

/// Largest PDU the NFC-DEP bridge accepts or returns
pub const NFCDEP_PDU_MAX_LEN: usize = 512;

/// NFCID3 length used on ATR_REQ/ATR_RES
pub const NFCDEP_NFCID3_LEN: usize = 10;

/// ATR_REQ length bounds (Digital 1.0 14.6.1): shortest ATR_REQ
pub const NFCDEP_ATR_REQ_MIN_LEN: usize = 16;
/// Longest ATR_REQ
pub const NFCDEP_ATR_REQ_MAX_LEN: usize = 64;

/// Maximum general bytes length carried on ATR_REQ/ATR_RES
pub const NFCDEP_GB_MAX_LEN: usize = NFCDEP_ATR_REQ_MAX_LEN - NFCDEP_ATR_REQ_MIN_LEN;

/// NFCID3 offset inside an ATR_REQ
pub const NFCDEP_ATR_REQ_NFCID3_POS: usize = 2;

/// NFC-DEP command prefix for requests and the ATR_REQ command code
pub const NFCDEP_CMD0_REQ: u8 = 0xD4;
/// ATR_REQ command code
pub const NFCDEP_CMD1_ATR_REQ: u8 = 0x00;

/// Start byte and length byte sizes of an NFC-DEP frame header
pub const NFCDEP_SB_LEN: usize = 1;
/// Length byte
pub const NFCDEP_LEN_LEN: usize = 1;

/// Length reduction value selecting 254 byte frames
pub const NFCDEP_LR_254: u8 = 3;

/// Frame size bounds derived from the length reduction value
pub const NFCDEP_FS_VAL_MIN: usize = 64;
/// LR = 3
pub const NFCDEP_FRAME_SIZE_MAX_LEN: usize = 254;

/// LR bit field inside PPi/PPt
pub const NFCDEP_PP_LR_MASK: u8 = 0x30;
/// Shift of the LR field
pub const NFCDEP_PP_LR_SHIFT: u8 = 4;

/// Target response waiting time [LLCP] 1.3 6.2.1
pub const NFCDEP_WT_TRG_MAX_L13: u8 = 10;

/// NFC-DEP operation flags
pub const NFCDEP_OPER_RTOX_REQ_EN: u8 = 0x00;
/// Attention commands allowed
pub const NFCDEP_OPER_ATN_EN: u8 = 0x02;
/// No empty DEP_REQ
pub const NFCDEP_OPER_EMPTY_DEP_DIS: u8 = 0x04;
/// Full chaining support
pub const NFCDEP_OPER_FULL_MI_EN: u8 = 0x08;

/// Operation flags used for both initiator and target activations
pub const NFCDEP_OPER_DEFAULT: u8 = NFCDEP_OPER_FULL_MI_EN
    | NFCDEP_OPER_EMPTY_DEP_DIS
    | NFCDEP_OPER_ATN_EN
    | NFCDEP_OPER_RTOX_REQ_EN;

/// ATR parameter values meaning "not used": no DID, no NAD, no bit rates
/// above 106 kbit/s offered in BSx/BRx
pub const NFCDEP_DID_NO: u8 = 0x00;
/// No NAD
pub const NFCDEP_NAD_NO: u8 = 0x00;
/// 106 kbit/s only
pub const NFCDEP_BX_NO_HIGH_BR: u8 = 0x00;

/// ISO-DEP RATS command byte and frame length
pub const ISODEP_CMD_RATS: u8 = 0xE0;
/// RATS length
pub const ISODEP_RATS_LEN: usize = 2;

/// Frame size integer selecting 256 byte frames (FSDI/FSCI = 8)
pub const ISODEP_FSXI_256: u8 = 8;

/// Listener defaults for the ATS
pub const ISODEP_DEFAULT_FWI: u8 = 8;
/// No extra start-up frame guard time
pub const ISODEP_DEFAULT_SFGI: u8 = 0;

/// DID value telling the ISO-DEP layer not to use a DID
pub const ISODEP_NO_DID: u8 = 0x00;

/// NFC-A SLP_REQ frame
pub const NFCA_SLP_REQ: [u8; 2] = [0x50, 0x00];

/// NFC-A UID/NFCID1 lengths
pub const NFCA_T1T_UID_LEN: usize = 4;
/// Triple size NFCID1
pub const NFCA_NFCID1_MAX_LEN: usize = 10;

/// NFC-B NFCID0, NFC-F NFCID2, NFC-V and ST25TB UID lengths
pub const NFCB_NFCID0_LEN: usize = 4;
/// NFCID2
pub const NFCF_NFCID2_LEN: usize = 8;
/// NFC-V UID
pub const NFCV_UID_LEN: usize = 8;
/// ST25TB UID
pub const ST25TB_UID_LEN: usize = 8;

/// Largest NFCID of any technology
pub const NFCID_MAX_LEN: usize = NFCDEP_NFCID3_LEN;
