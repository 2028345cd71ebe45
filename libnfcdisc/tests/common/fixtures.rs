// Devices and frames shared by the integration tests

use libnfcdisc::device::{
    IsoDepInfo, ListenDevice, NfcDepInfo, NfcaListenDevice, NfcaType, NfcbListenDevice,
    NfcfListenDevice, NfcvListenDevice, St25tbListenDevice,
};
use libnfcdisc::types::{BitRate, CommMode, Nfcid};

pub fn bytes(s: &str) -> Vec<u8> {
    hex::decode(s.replace(' ', "")).unwrap()
}

pub fn t2t() -> ListenDevice {
    ListenDevice::NfcA(NfcaListenDevice::new(NfcaType::T2t, &bytes("04a1b2c3d4e5f6")).unwrap())
}

pub fn t4t() -> ListenDevice {
    ListenDevice::NfcA(NfcaListenDevice::new(NfcaType::T4t, &bytes("08123456")).unwrap())
}

pub fn nfca_dep() -> ListenDevice {
    ListenDevice::NfcA(NfcaListenDevice::new(NfcaType::NfcDep, &bytes("08aabbcc")).unwrap())
}

pub fn t1t() -> ListenDevice {
    ListenDevice::NfcA(NfcaListenDevice::t1t([0x11, 0x22, 0x33, 0x44]))
}

pub fn nfcb(iso_dep: bool) -> ListenDevice {
    ListenDevice::NfcB(NfcbListenDevice::new([0x5a, 0x01, 0x02, 0x03], iso_dep))
}

pub fn t3t() -> ListenDevice {
    ListenDevice::NfcF(NfcfListenDevice::new([0x01, 0x2e, 0x3c, 0x4d, 0x5e, 0x6f, 0x70, 0x81]))
}

pub fn nfcf_dep() -> ListenDevice {
    ListenDevice::NfcF(NfcfListenDevice::new([0x01, 0xfe, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f]))
}

pub fn nfcv() -> ListenDevice {
    ListenDevice::NfcV(NfcvListenDevice {
        uid: [0xe0, 0x04, 0x01, 0x50, 0x12, 0x34, 0x56, 0x78],
        dsfid: 0,
    })
}

pub fn st25tb() -> ListenDevice {
    ListenDevice::St25tb(St25tbListenDevice {
        uid: [0xd0, 0x02, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88],
        chip_id: 0x1b,
    })
}

pub fn iso_dep_info(fsx: usize) -> IsoDepInfo {
    IsoDepInfo {
        fsx,
        fwt: 4_096,
        dfwt: 256,
        did: 0,
        dsi: BitRate::Br106,
        dri: BitRate::Br106,
    }
}

/// Peer answering ATR_REQ with PPt announcing LR=254
pub fn nfc_dep_peer(comm_mode: CommMode) -> NfcDepInfo {
    NfcDepInfo {
        nfcid3: Nfcid::try_from(&bytes("a0a1a2a3a4a5a6a7a8a9")[..]).unwrap(),
        pp: 0x32,
        did: 0,
        fwt: 8_192,
        dfwt: 512,
        comm_mode,
        general_bytes: bytes("46666d010111"),
    }
}

/// SELECT of the NDEF application
pub fn select_ndef_apdu() -> Vec<u8> {
    bytes("00 a4 04 00 07 d2 76 00 00 85 01 01 00")
}

pub const SW_OK: [u8; 2] = [0x90, 0x00];

/// RATS with FSDI=8 (256 bytes), no DID
pub fn rats() -> Vec<u8> {
    bytes("e0 80")
}

pub const SLP_REQ: [u8; 2] = [0x50, 0x00];

/// ATR_REQ body: CMD0 CMD1 NFCID3i DIDi BSi BRi PPi + general bytes
pub fn atr_req_body() -> Vec<u8> {
    bytes("d4 00 c0c1c2c3c4c5c6c7c8c9 00 00 00 32 46666d010111")
}

/// ATR_REQ framed the way NFC-A delivers it (SB + LEN)
pub fn nfca_atr_req() -> Vec<u8> {
    let body = atr_req_body();
    let mut f = vec![0xf0, (body.len() + 1) as u8];
    f.extend_from_slice(&body);
    f
}

/// ATR_REQ framed the way NFC-F delivers it (LEN)
pub fn nfcf_atr_req() -> Vec<u8> {
    let body = atr_req_body();
    let mut f = vec![(body.len() + 1) as u8];
    f.extend_from_slice(&body);
    f
}

/// T3T CHECK command
pub fn t3t_check() -> Vec<u8> {
    bytes("10 06 0102030405060708 01 0b00 01 8000")
}
