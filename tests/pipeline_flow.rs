//! End-to-end execute and query flows against a mock LCD.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use k256::ecdsa::signature::Verifier;
use k256::ecdsa::{Signature, VerifyingKey};
use prost::Message;
use serde_json::json;

use secret_tx::blockchain::{LocalWallet, TxStatus, WalletKeyProvider};
use secret_tx::crypto::cipher::CipherResult;
use secret_tx::crypto::{EncryptedEnvelope, EncryptionSeed, MessageCipher, MessageEncryptor, Nonce};
use secret_tx::encoding::address;
use secret_tx::encoding::proto::{
    Any, AuthInfo, MsgExecuteContract, MsgExecuteContractResponse, SignDoc, TxBody, TxMsgData,
    TxRaw, MSG_EXECUTE_CONTRACT_RESPONSE_TYPE_URL,
};
use secret_tx::pipeline::{ContractCall, ExecuteRequest, Pipeline, QueryRequest};

mod common;
use common::{
    account_body, not_found_body, test_config, CODE_HASH, CONTRACT_A, CONTRACT_B, TEST_PRIVATE_KEY,
};

const FIXED_NONCE: Nonce = [0x22; 32];
const TX_HASH: &str = "5F3B0D2C9A4E7F61B8C2D0E9A7F3B1C5D4E6F8A0B2C4D6E8F0A1B3C5D7E9F1A3";

/// `{"transfer":{"status":"success"}}`, base64-wrapped, sealed under the fixed nonce.
const EXECUTE_RESPONSE_CT: &str =
    "nCseKS8JGeTby7AChDbXe9bVBQzYeIInKOd9wkqjStEPso1hDHNaEKfvIsbqfBDjRqNM3E5JEo72xgLZ";

/// `{"balance":{"amount":"42"}}`, base64-wrapped, sealed under the fixed nonce.
const QUERY_RESPONSE_CT: &str =
    "ZxXI0Tq7chYArZoKCprN8/NMxAMSTk0i6XIMSNNcQcMjYzIu5FycrV0EfCBAdUCbQMDHow==";

/// Cipher that always uses the same nonce so responses can be precomputed.
struct FixedNonceCipher(MessageCipher);

impl MessageEncryptor for FixedNonceCipher {
    fn encrypt(
        &self,
        code_hash: Option<&str>,
        plaintext_json: &str,
        seed: &EncryptionSeed,
    ) -> CipherResult<EncryptedEnvelope> {
        self.0.encrypt_with_nonce(FIXED_NONCE, code_hash, plaintext_json, seed)
    }

    fn decrypt(
        &self,
        ciphertext: &[u8],
        nonce: &Nonce,
        seed: &EncryptionSeed,
    ) -> CipherResult<Vec<u8>> {
        self.0.decrypt(ciphertext, nonce, seed)
    }
}

fn tx_msg_data_hex(responses: usize) -> String {
    let ct = BASE64.decode(EXECUTE_RESPONSE_CT).unwrap();
    let data = TxMsgData {
        data: Vec::new(),
        msg_responses: (0..responses)
            .map(|_| Any {
                type_url: MSG_EXECUTE_CONTRACT_RESPONSE_TYPE_URL.to_string(),
                value: MsgExecuteContractResponse { data: ct.clone() }.encode_to_vec(),
            })
            .collect(),
    };
    hex::encode_upper(data.encode_to_vec())
}

/// Mock LCD for a successful execute of `responses` messages.
async fn start_happy_lcd(responses: usize) -> common::MockLcd {
    let data_hex = tx_msg_data_hex(responses);
    common::start_programmable_backend(move |req| {
        let data_hex = data_hex.clone();
        async move {
            match (req.method.as_str(), req.route()) {
                ("GET", r) if r.starts_with("/cosmos/auth/v1beta1/accounts/") => {
                    (200, account_body(17, 4))
                }
                ("GET", r) if r.starts_with("/compute/v1beta1/code_hash/by_contract_address/") => {
                    (200, json!({ "code_hash": CODE_HASH.to_uppercase() }).to_string())
                }
                ("POST", "/cosmos/tx/v1beta1/txs") => {
                    let tx =
                        json!({ "height": "0", "txhash": TX_HASH, "code": 0, "raw_log": "[]" });
                    (200, json!({ "tx_response": tx }).to_string())
                }
                ("GET", r) if r == format!("/cosmos/tx/v1beta1/txs/{}", TX_HASH) => (
                    200,
                    json!({
                        "tx_response": {
                            "height": "1234567",
                            "txhash": TX_HASH,
                            "code": 0,
                            "data": data_hex,
                            "raw_log": "",
                            "logs": [],
                            "gas_wanted": "200000",
                            "gas_used": "91234",
                            "events": [{ "type": "execute", "attributes": [] }]
                        }
                    })
                    .to_string(),
                ),
                _ => (404, not_found_body()),
            }
        }
    })
    .await
}

fn broadcast_tx(lcd: &common::MockLcd) -> TxRaw {
    let post = lcd
        .requests()
        .into_iter()
        .find(|r| r.method == "POST")
        .expect("broadcast request");
    let body: serde_json::Value = serde_json::from_str(&post.body).unwrap();
    assert_eq!(body["mode"], "BROADCAST_MODE_SYNC");
    let bytes = BASE64.decode(body["tx_bytes"].as_str().unwrap()).unwrap();
    TxRaw::decode(bytes.as_slice()).unwrap()
}

#[tokio::test]
async fn test_execute_confirms_and_decrypts_response() {
    let lcd = start_happy_lcd(1).await;
    let config = test_config(&lcd);
    let cipher = FixedNonceCipher(MessageCipher::mainnet());
    let pipeline = Pipeline::with_encryptor(&config, cipher).unwrap();
    let wallet = LocalWallet::from_private_key_default(TEST_PRIVATE_KEY).unwrap();

    let msg = r#"{"transfer":{"recipient":"secret1xyz","amount":"10"}}"#;
    let call = ContractCall::new(CONTRACT_A, msg)
        .with_code_hash(CODE_HASH)
        .with_funds("1000uscrt");
    let ctx = pipeline.new_context();
    let outcome = pipeline
        .execute(&ctx, &wallet, ExecuteRequest::single(call).with_memo("hello"))
        .await
        .unwrap();

    assert_eq!(outcome.tx_hash, TX_HASH);
    assert!(outcome.broadcast.is_accepted());
    match &outcome.status {
        TxStatus::Confirmed(tx) => {
            assert_eq!(tx.height, 1_234_567);
            assert_eq!(tx.gas_used, 91_234);
        }
        other => panic!("expected confirmation, got {:?}", other),
    }
    assert_eq!(outcome.responses, vec![Some(json!({ "transfer": { "status": "success" } }))]);

    // Code hash was supplied, so no lookup.
    assert_eq!(lcd.count("/compute/v1beta1/code_hash"), 0);

    let raw = broadcast_tx(&lcd);
    let body = TxBody::decode(raw.body_bytes.as_slice()).unwrap();
    assert_eq!(body.memo, "hello");
    let msg = MsgExecuteContract::decode(body.messages[0].value.as_slice()).unwrap();
    assert_eq!(msg.sent_funds.len(), 1);
    assert_eq!(msg.sent_funds[0].amount, "1000");

    let env = EncryptedEnvelope::from_bytes(&msg.msg).unwrap();
    assert_eq!(env.nonce(), &FIXED_NONCE);
    let plain = MessageCipher::mainnet()
        .decrypt(env.ciphertext(), env.nonce(), &wallet.encryption_seed())
        .unwrap();
    assert!(plain.starts_with(CODE_HASH.as_bytes()));
}

#[tokio::test]
async fn test_execute_signature_and_sequence() {
    let lcd = start_happy_lcd(1).await;
    let mut config = test_config(&lcd);
    config.confirmation.enabled = false;
    let pipeline = Pipeline::from_config(&config).unwrap();
    let wallet = LocalWallet::from_private_key_default(TEST_PRIVATE_KEY).unwrap();

    let call = ContractCall::new(CONTRACT_A, r#"{"increment":{}}"#).with_code_hash(CODE_HASH);
    let outcome = pipeline
        .execute(&pipeline.new_context(), &wallet, ExecuteRequest::single(call))
        .await
        .unwrap();
    assert_eq!(outcome.status, TxStatus::Unconfirmed);
    assert_eq!(outcome.responses, vec![None]);
    assert_eq!(lcd.count(&format!("/cosmos/tx/v1beta1/txs/{}", TX_HASH)), 0);

    let raw = broadcast_tx(&lcd);
    let auth = AuthInfo::decode(raw.auth_info_bytes.as_slice()).unwrap();
    assert_eq!(auth.signer_infos[0].sequence, 4);

    let sign_doc = SignDoc {
        body_bytes: raw.body_bytes.clone(),
        auth_info_bytes: raw.auth_info_bytes.clone(),
        chain_id: "secret-4".to_string(),
        account_number: 17,
    }
    .encode_to_vec();
    let vk = VerifyingKey::from_sec1_bytes(&wallet.public_key()).unwrap();
    let signature = Signature::from_slice(&raw.signatures[0]).unwrap();
    assert!(vk.verify(&sign_doc, &signature).is_ok());
}

#[tokio::test]
async fn test_multi_message_order_and_code_hash_lookup() {
    let lcd = start_happy_lcd(3).await;
    let config = test_config(&lcd);
    let cipher = FixedNonceCipher(MessageCipher::mainnet());
    let pipeline = Pipeline::with_encryptor(&config, cipher).unwrap();
    let wallet = LocalWallet::from_private_key_default(TEST_PRIVATE_KEY).unwrap();

    let request = ExecuteRequest::batch(vec![
        ContractCall::new(CONTRACT_A, r#"{"step":{"n":1}}"#),
        ContractCall::new(CONTRACT_B, r#"{"step":{"n":2}}"#),
        ContractCall::new(CONTRACT_A, r#"{"step":{"n":3}}"#),
    ]);
    let outcome = pipeline.execute(&pipeline.new_context(), &wallet, request).await.unwrap();
    assert_eq!(outcome.responses.len(), 3);
    assert!(outcome.responses.iter().all(Option::is_some));

    // One lookup per distinct contract.
    assert_eq!(lcd.count("/compute/v1beta1/code_hash/by_contract_address/"), 2);

    let raw = broadcast_tx(&lcd);
    let body = TxBody::decode(raw.body_bytes.as_slice()).unwrap();
    let seed = wallet.encryption_seed();
    let cipher = MessageCipher::mainnet();

    let decoded: Vec<(Vec<u8>, Vec<u8>)> = body
        .messages
        .iter()
        .map(|any| {
            let msg = MsgExecuteContract::decode(any.value.as_slice()).unwrap();
            let env = EncryptedEnvelope::from_bytes(&msg.msg).unwrap();
            let plain = cipher.decrypt(env.ciphertext(), env.nonce(), &seed).unwrap();
            (msg.contract, plain)
        })
        .collect();

    let contract_a = address::decode(CONTRACT_A, "secret").unwrap().to_vec();
    let contract_b = address::decode(CONTRACT_B, "secret").unwrap().to_vec();
    assert_eq!(decoded.len(), 3);
    assert_eq!(decoded[0].0, contract_a);
    assert_eq!(decoded[1].0, contract_b);
    assert_eq!(decoded[2].0, contract_a);
    assert_eq!(decoded[0].1, format!("{}{}", CODE_HASH, r#"{"step":{"n":1}}"#).into_bytes());
    assert_eq!(decoded[1].1, format!("{}{}", CODE_HASH, r#"{"step":{"n":2}}"#).into_bytes());
    assert_eq!(decoded[2].1, format!("{}{}", CODE_HASH, r#"{"step":{"n":3}}"#).into_bytes());
}

#[tokio::test]
async fn test_query_decrypts_reference_response() {
    let lcd = common::start_programmable_backend(|req| async move {
        if req.route().starts_with("/compute/v1beta1/query/") {
            (200, json!({ "data": QUERY_RESPONSE_CT }).to_string())
        } else {
            (404, not_found_body())
        }
    })
    .await;
    let config = test_config(&lcd);
    let cipher = FixedNonceCipher(MessageCipher::mainnet());
    let pipeline = Pipeline::with_encryptor(&config, cipher).unwrap();
    let wallet = LocalWallet::from_private_key_default(TEST_PRIVATE_KEY).unwrap();

    // Truncated code hash is refused before any request.
    let request = QueryRequest::new(CONTRACT_A, r#"{"balance":{}}"#).with_code_hash("abc123");
    let err = pipeline
        .query(&pipeline.new_context(), &wallet, request)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
    assert!(lcd.requests().is_empty());

    let request = QueryRequest::new(CONTRACT_A, r#"{"balance":{}}"#).with_code_hash(CODE_HASH);
    let answer = pipeline
        .query(&pipeline.new_context(), &wallet, request)
        .await
        .unwrap();
    assert_eq!(answer, json!({ "balance": { "amount": "42" } }));

    let sent = lcd.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].route(), format!("/compute/v1beta1/query/{}", CONTRACT_A));
    let envelope = BASE64.decode(sent[0].query_param("query").unwrap()).unwrap();
    assert_eq!(&envelope[..32], &FIXED_NONCE);
}
