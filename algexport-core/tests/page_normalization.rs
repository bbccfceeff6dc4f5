use algexport_core::{TransactionPage, flatten, normalize};
use chrono::DateTime;

const ME: &str = "OBSERVER";

/// An indexer page: an app call whose inner transactions pay the observer,
/// followed by an outgoing payment that earned rewards.
const PAGE: &str = r#"{
  "current-round": 5000,
  "next-token": "tok-1",
  "transactions": [
    {
      "id": "APPCALL",
      "sender": "OBSERVER",
      "confirmed-round": 4000,
      "round-time": 1650000000,
      "tx-type": "appl",
      "fee": 2000,
      "inner-txns": [
        {
          "sender": "APPACCOUNT",
          "confirmed-round": 4000,
          "round-time": 1650000000,
          "tx-type": "pay",
          "fee": 0,
          "payment-transaction": { "receiver": "OBSERVER", "amount": 250000 }
        },
        {
          "sender": "APPACCOUNT",
          "confirmed-round": 4000,
          "round-time": 1650000000,
          "tx-type": "axfer",
          "fee": 0,
          "asset-transfer-transaction": { "asset-id": 31566704, "receiver": "OBSERVER", "amount": 1500000 }
        }
      ]
    },
    {
      "id": "PAYOUT",
      "sender": "OBSERVER",
      "confirmed-round": 4010,
      "round-time": 1650000100,
      "tx-type": "pay",
      "fee": 1000,
      "sender-rewards": 777,
      "payment-transaction": { "receiver": "FRIEND", "amount": 100000 }
    }
  ]
}"#;

#[test]
fn test_page_flattens_and_normalizes_in_order() {
    let page: TransactionPage = serde_json::from_str(PAGE).unwrap();
    assert_eq!(page.current_round, 5000);
    assert_eq!(page.next_token.as_deref(), Some("tok-1"));

    let mut records = Vec::new();
    for flat in flatten(&page.transactions) {
        records.extend(normalize(flat.tx, flat.parent_txid, ME).unwrap());
    }

    // inner pay, inner axfer, app-call fee, payout, payout reward
    assert_eq!(records.len(), 5);

    assert_eq!(records[0].recv_qty, 250000);
    assert_eq!(records[0].display_txid(), "APPCALL");
    assert_eq!(records[1].asset_id, 31566704);
    assert_eq!(records[1].parent_txid.as_deref(), Some("APPCALL"));
    assert!(records[2].fee_only);
    assert_eq!(records[2].fee, 2000);
    assert_eq!(records[2].parent_txid, None);

    assert_eq!(records[3].sent_qty, 100000);
    assert_eq!(records[3].fee, 1000);
    assert!(records[4].reward);
    assert_eq!(
        records[4].block_time,
        DateTime::from_timestamp(1650000099, 0).unwrap()
    );
}

#[test]
fn test_no_record_is_empty_or_double_sided() {
    let page: TransactionPage = serde_json::from_str(PAGE).unwrap();
    for flat in flatten(&page.transactions) {
        for r in normalize(flat.tx, flat.parent_txid, ME).unwrap() {
            assert!(!r.is_noop());
            assert!(r.recv_qty == 0 || r.sent_qty == 0);
        }
    }
}
