//! Protobuf wire types for Cosmos SDK transactions and Secret compute messages.
//!
//! Field numbers follow the published `cosmos.tx.v1beta1`,
//! `cosmos.base.v1beta1`, `cosmos.crypto.secp256k1` and
//! `secret.compute.v1beta1` schemas. Only the fields this client emits or
//! reads are declared; prost skips unknown fields on decode.

/// Type URL of the contract execute message.
pub const MSG_EXECUTE_CONTRACT_TYPE_URL: &str = "/secret.compute.v1beta1.MsgExecuteContract";

/// Type URL of the contract execute response carried in `TxMsgData`.
pub const MSG_EXECUTE_CONTRACT_RESPONSE_TYPE_URL: &str =
    "/secret.compute.v1beta1.MsgExecuteContractResponse";

/// Type URL of a compressed secp256k1 public key.
pub const SECP256K1_PUBKEY_TYPE_URL: &str = "/cosmos.crypto.secp256k1.PubKey";

/// `google.protobuf.Any`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Any {
    #[prost(string, tag = "1")]
    pub type_url: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: ::prost::alloc::vec::Vec<u8>,
}

/// `cosmos.base.v1beta1.Coin`.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct Coin {
    #[prost(string, tag = "1")]
    pub denom: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub amount: ::prost::alloc::string::String,
}

/// `secret.compute.v1beta1.MsgExecuteContract`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgExecuteContract {
    /// Canonical sender address.
    #[prost(bytes = "vec", tag = "1")]
    pub sender: ::prost::alloc::vec::Vec<u8>,
    /// Canonical contract address.
    #[prost(bytes = "vec", tag = "2")]
    pub contract: ::prost::alloc::vec::Vec<u8>,
    /// Encrypted envelope.
    #[prost(bytes = "vec", tag = "3")]
    pub msg: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, tag = "4")]
    pub callback_code_hash: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "5")]
    pub sent_funds: ::prost::alloc::vec::Vec<Coin>,
    #[prost(bytes = "vec", tag = "6")]
    pub callback_sig: ::prost::alloc::vec::Vec<u8>,
}

/// `secret.compute.v1beta1.MsgExecuteContractResponse`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgExecuteContractResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub data: ::prost::alloc::vec::Vec<u8>,
}

/// `cosmos.crypto.secp256k1.PubKey`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PubKey {
    #[prost(bytes = "vec", tag = "1")]
    pub key: ::prost::alloc::vec::Vec<u8>,
}

/// `cosmos.tx.v1beta1.TxBody`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxBody {
    #[prost(message, repeated, tag = "1")]
    pub messages: ::prost::alloc::vec::Vec<Any>,
    #[prost(string, tag = "2")]
    pub memo: ::prost::alloc::string::String,
    #[prost(uint64, tag = "3")]
    pub timeout_height: u64,
}

/// `cosmos.tx.signing.v1beta1.SignMode`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum SignMode {
    Unspecified = 0,
    Direct = 1,
}

/// `cosmos.tx.v1beta1.ModeInfo`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ModeInfo {
    #[prost(oneof = "mode_info::Sum", tags = "1")]
    pub sum: ::core::option::Option<mode_info::Sum>,
}

pub mod mode_info {
    /// `ModeInfo.Single`.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Single {
        #[prost(enumeration = "super::SignMode", tag = "1")]
        pub mode: i32,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Sum {
        #[prost(message, tag = "1")]
        Single(Single),
    }
}

impl ModeInfo {
    /// Single-signer direct mode.
    pub fn direct() -> Self {
        Self {
            sum: Some(mode_info::Sum::Single(mode_info::Single {
                mode: SignMode::Direct as i32,
            })),
        }
    }
}

/// `cosmos.tx.v1beta1.SignerInfo`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignerInfo {
    #[prost(message, optional, tag = "1")]
    pub public_key: ::core::option::Option<Any>,
    #[prost(message, optional, tag = "2")]
    pub mode_info: ::core::option::Option<ModeInfo>,
    #[prost(uint64, tag = "3")]
    pub sequence: u64,
}

/// `cosmos.tx.v1beta1.Fee`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Fee {
    #[prost(message, repeated, tag = "1")]
    pub amount: ::prost::alloc::vec::Vec<Coin>,
    #[prost(uint64, tag = "2")]
    pub gas_limit: u64,
    #[prost(string, tag = "3")]
    pub payer: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub granter: ::prost::alloc::string::String,
}

/// `cosmos.tx.v1beta1.AuthInfo`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AuthInfo {
    #[prost(message, repeated, tag = "1")]
    pub signer_infos: ::prost::alloc::vec::Vec<SignerInfo>,
    #[prost(message, optional, tag = "2")]
    pub fee: ::core::option::Option<Fee>,
}

/// `cosmos.tx.v1beta1.SignDoc`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignDoc {
    #[prost(bytes = "vec", tag = "1")]
    pub body_bytes: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub auth_info_bytes: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, tag = "3")]
    pub chain_id: ::prost::alloc::string::String,
    #[prost(uint64, tag = "4")]
    pub account_number: u64,
}

/// `cosmos.tx.v1beta1.TxRaw`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxRaw {
    #[prost(bytes = "vec", tag = "1")]
    pub body_bytes: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub auth_info_bytes: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub signatures: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
}

/// `cosmos.base.abci.v1beta1.MsgData` (pre-0.46 responses).
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgData {
    #[prost(string, tag = "1")]
    pub msg_type: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "2")]
    pub data: ::prost::alloc::vec::Vec<u8>,
}

/// `cosmos.base.abci.v1beta1.TxMsgData`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxMsgData {
    #[prost(message, repeated, tag = "1")]
    pub data: ::prost::alloc::vec::Vec<MsgData>,
    #[prost(message, repeated, tag = "2")]
    pub msg_responses: ::prost::alloc::vec::Vec<Any>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_coin_wire_bytes() {
        let coin = Coin {
            denom: "uscrt".into(),
            amount: "1000".into(),
        };
        let mut expected = vec![0x0a, 0x05];
        expected.extend_from_slice(b"uscrt");
        expected.extend_from_slice(&[0x12, 0x04]);
        expected.extend_from_slice(b"1000");
        assert_eq!(coin.encode_to_vec(), expected);
    }

    #[test]
    fn test_sign_doc_field_order() {
        let doc = SignDoc {
            body_bytes: vec![0xaa],
            auth_info_bytes: vec![0xbb],
            chain_id: "secret-4".into(),
            account_number: 7,
        };
        let mut expected = vec![0x0a, 0x01, 0xaa, 0x12, 0x01, 0xbb, 0x1a, 0x08];
        expected.extend_from_slice(b"secret-4");
        expected.extend_from_slice(&[0x20, 0x07]);
        assert_eq!(doc.encode_to_vec(), expected);
    }

    #[test]
    fn test_direct_mode_info_bytes() {
        // ModeInfo { single { mode: DIRECT } }
        assert_eq!(ModeInfo::direct().encode_to_vec(), vec![0x0a, 0x02, 0x08, 0x01]);
    }

    #[test]
    fn test_zero_account_number_omitted() {
        let doc = SignDoc {
            body_bytes: Vec::new(),
            auth_info_bytes: Vec::new(),
            chain_id: String::new(),
            account_number: 0,
        };
        assert!(doc.encode_to_vec().is_empty());
    }
}
