//! Unsigned transfer construction.
//!
//! Pure transaction assembly: given prepared inputs, a recipient, an
//! amount, and a fee, produce an unsigned PSBT ready for an external
//! signer. No I/O happens here -- providers gather the inputs through
//! [`ChainSource`](crate::chain_source::ChainSource) and hand the
//! result to a bridge for signing.
//!
//! Rules:
//!
//! - every supplied input is consumed, in order
//! - a change output back to `change_address` is added only when the
//!   remainder exceeds the dust threshold; sub-dust change is silently
//!   absorbed into the fee
//! - inputs that cannot cover amount + fee fail with
//!   [`WalletError::InsufficientFunds`] before anything is built

use std::str::FromStr;

use bitcoin::absolute::LockTime;
use bitcoin::transaction::Version;
use bitcoin::{
    Address, Amount, OutPoint, Psbt, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness,
};

use config::constants::DUST_THRESHOLD_SATS;
use wallet_core::Network;

use crate::chain_source::Utxo;
use crate::error::WalletError;

// ---------------------------------------------------------------------------
// Fee estimation
// ---------------------------------------------------------------------------

/// Strategy for choosing the transfer fee.
pub trait FeeEstimator: Send + Sync {
    /// Fee in satoshis for a transaction of the given shape.
    fn fee_sats(&self, input_count: usize, output_count: usize) -> u64;
}

/// Flat fee regardless of transaction shape.
#[derive(Debug, Clone, Copy)]
pub struct FixedFee(pub u64);

impl Default for FixedFee {
    fn default() -> Self {
        Self(config::constants::DEFAULT_FEE_SATS)
    }
}

impl FeeEstimator for FixedFee {
    fn fee_sats(&self, _input_count: usize, _output_count: usize) -> u64 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Transfer assembly
// ---------------------------------------------------------------------------

/// An input ready for inclusion: the unspent output plus the previous
/// transaction's output it spends, needed for the PSBT witness data.
#[derive(Debug, Clone)]
pub struct TransferInput {
    /// The unspent output being consumed.
    pub utxo: Utxo,
    /// The output of the funding transaction at `utxo.vout`.
    pub prev_txout: TxOut,
}

/// A fully assembled, unsigned transfer.
#[derive(Debug, Clone)]
pub struct UnsignedTransfer {
    /// The PSBT, with `witness_utxo` populated on every input.
    pub psbt: Psbt,
    /// Declared fee in satoshis (excludes absorbed sub-dust change).
    pub fee_sats: u64,
    /// Remainder returned to the change address; zero or sub-dust
    /// values mean no change output was added.
    pub change_sats: u64,
}

impl UnsignedTransfer {
    /// Whether a change output was added to the transaction.
    pub fn has_change_output(&self) -> bool {
        self.change_sats > DUST_THRESHOLD_SATS
    }
}

/// Assemble an unsigned transfer PSBT.
///
/// `inputs` are consumed in order, all of them. The recipient output
/// comes first, followed by the change output when one is warranted.
pub fn build_transfer_psbt(
    inputs: &[TransferInput],
    recipient: &str,
    amount_sats: u64,
    change_address: &str,
    fee_sats: u64,
    network: Network,
) -> Result<UnsignedTransfer, WalletError> {
    if inputs.is_empty() {
        return Err(WalletError::NoUnspentOutputs);
    }

    let network = bitcoin_network(network);
    let recipient_script = parse_address(recipient, network)?.script_pubkey();
    let change_script = parse_address(change_address, network)?.script_pubkey();

    let total_input: u64 = inputs.iter().map(|input| input.utxo.value).sum();
    let spend = amount_sats
        .checked_add(fee_sats)
        .ok_or(WalletError::InsufficientFunds)?;
    if total_input < spend {
        return Err(WalletError::InsufficientFunds);
    }
    let change_sats = total_input - spend;

    let mut output = vec![TxOut {
        value: Amount::from_sat(amount_sats),
        script_pubkey: recipient_script,
    }];
    if change_sats > DUST_THRESHOLD_SATS {
        output.push(TxOut {
            value: Amount::from_sat(change_sats),
            script_pubkey: change_script,
        });
    }

    let input = inputs
        .iter()
        .map(|input| {
            let txid = Txid::from_str(&input.utxo.txid).map_err(|_| {
                WalletError::Network(format!("invalid txid from chain source: {}", input.utxo.txid))
            })?;
            Ok(TxIn {
                previous_output: OutPoint::new(txid, input.utxo.vout),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::default(),
            })
        })
        .collect::<Result<Vec<_>, WalletError>>()?;

    let unsigned_tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input,
        output,
    };

    let mut psbt = Psbt::from_unsigned_tx(unsigned_tx)
        .map_err(|err| WalletError::SigningFailed(err.to_string()))?;
    for (psbt_input, input) in psbt.inputs.iter_mut().zip(inputs) {
        psbt_input.witness_utxo = Some(input.prev_txout.clone());
    }

    tracing::debug!(
        inputs = inputs.len(),
        amount_sats,
        fee_sats,
        change_sats,
        "assembled unsigned transfer"
    );

    Ok(UnsignedTransfer {
        psbt,
        fee_sats,
        change_sats,
    })
}

/// Parse and network-check an address string.
pub fn parse_address(address: &str, network: bitcoin::Network) -> Result<Address, WalletError> {
    address
        .parse::<Address<bitcoin::address::NetworkUnchecked>>()
        .map_err(|_| WalletError::InvalidAddress)?
        .require_network(network)
        .map_err(|_| WalletError::InvalidAddress)
}

/// Decode a consensus-encoded transaction from hex.
pub fn parse_raw_tx(tx_hex: &str) -> Result<Transaction, WalletError> {
    let bytes = hex::decode(tx_hex.trim())
        .map_err(|_| WalletError::Network("invalid transaction hex from chain source".into()))?;
    bitcoin::consensus::encode::deserialize(&bytes)
        .map_err(|_| WalletError::Network("malformed transaction from chain source".into()))
}

fn bitcoin_network(network: Network) -> bitcoin::Network {
    match network {
        Network::Mainnet => bitcoin::Network::Bitcoin,
        Network::Testnet => bitcoin::Network::Testnet,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const RECIPIENT: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";
    const CHANGE: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";

    fn input(txid_byte: u8, vout: u32, value: u64) -> TransferInput {
        let txid = hex::encode([txid_byte; 32]);
        let script = parse_address(CHANGE, bitcoin::Network::Bitcoin)
            .unwrap()
            .script_pubkey();
        TransferInput {
            utxo: Utxo { txid, vout, value },
            prev_txout: TxOut {
                value: Amount::from_sat(value),
                script_pubkey: script,
            },
        }
    }

    #[test]
    fn builds_transfer_with_change() {
        let inputs = vec![input(0xaa, 0, 100_000)];
        let transfer =
            build_transfer_psbt(&inputs, RECIPIENT, 50_000, CHANGE, 500, Network::Mainnet)
                .unwrap();

        let tx = &transfer.psbt.unsigned_tx;
        assert_eq!(tx.input.len(), 1);
        assert_eq!(tx.output.len(), 2);
        assert_eq!(tx.output[0].value, Amount::from_sat(50_000));
        assert_eq!(tx.output[1].value, Amount::from_sat(49_500));
        assert_eq!(transfer.change_sats, 49_500);
        assert!(transfer.has_change_output());

        // Outputs plus fee account for every input satoshi.
        let out_total: u64 = tx.output.iter().map(|o| o.value.to_sat()).sum();
        assert_eq!(out_total + transfer.fee_sats, 100_000);
    }

    #[test]
    fn sub_dust_change_is_absorbed_into_fee() {
        let inputs = vec![input(0xaa, 0, 51_000)];
        let transfer =
            build_transfer_psbt(&inputs, RECIPIENT, 50_000, CHANGE, 500, Network::Mainnet)
                .unwrap();

        // 500 sats of change is below the dust threshold: one output,
        // effective fee of 1000.
        assert_eq!(transfer.psbt.unsigned_tx.output.len(), 1);
        assert_eq!(transfer.change_sats, 500);
        assert!(!transfer.has_change_output());
    }

    #[test]
    fn exact_dust_change_is_absorbed() {
        let inputs = vec![input(0xaa, 0, 51_046)];
        let transfer =
            build_transfer_psbt(&inputs, RECIPIENT, 50_000, CHANGE, 500, Network::Mainnet)
                .unwrap();
        assert_eq!(transfer.change_sats, 546);
        assert_eq!(transfer.psbt.unsigned_tx.output.len(), 1);
    }

    #[test]
    fn insufficient_funds_counts_the_fee() {
        let inputs = vec![input(0xaa, 0, 50_000)];
        let err = build_transfer_psbt(&inputs, RECIPIENT, 49_600, CHANGE, 500, Network::Mainnet)
            .unwrap_err();
        assert_eq!(err, WalletError::InsufficientFunds);
    }

    #[test]
    fn exact_cover_spends_everything_without_change() {
        let inputs = vec![input(0xaa, 0, 50_500)];
        let transfer =
            build_transfer_psbt(&inputs, RECIPIENT, 50_000, CHANGE, 500, Network::Mainnet)
                .unwrap();
        assert_eq!(transfer.change_sats, 0);
        assert_eq!(transfer.psbt.unsigned_tx.output.len(), 1);
    }

    #[test]
    fn all_inputs_are_consumed_in_order() {
        let inputs = vec![
            input(0xaa, 1, 30_000),
            input(0xbb, 0, 40_000),
            input(0xcc, 2, 30_000),
        ];
        let transfer =
            build_transfer_psbt(&inputs, RECIPIENT, 50_000, CHANGE, 500, Network::Mainnet)
                .unwrap();

        let tx = &transfer.psbt.unsigned_tx;
        assert_eq!(tx.input.len(), 3);
        for (tx_in, prepared) in tx.input.iter().zip(&inputs) {
            assert_eq!(tx_in.previous_output.txid.to_string(), prepared.utxo.txid);
            assert_eq!(tx_in.previous_output.vout, prepared.utxo.vout);
        }
    }

    #[test]
    fn witness_utxo_is_populated_on_every_input() {
        let inputs = vec![input(0xaa, 0, 60_000), input(0xbb, 1, 60_000)];
        let transfer =
            build_transfer_psbt(&inputs, RECIPIENT, 100_000, CHANGE, 500, Network::Mainnet)
                .unwrap();
        for (psbt_input, prepared) in transfer.psbt.inputs.iter().zip(&inputs) {
            let witness = psbt_input.witness_utxo.as_ref().unwrap();
            assert_eq!(witness.value, Amount::from_sat(prepared.utxo.value));
        }
    }

    #[test]
    fn empty_inputs_fail_before_parsing() {
        let err =
            build_transfer_psbt(&[], RECIPIENT, 1_000, CHANGE, 500, Network::Mainnet).unwrap_err();
        assert_eq!(err, WalletError::NoUnspentOutputs);
    }

    #[test]
    fn rejects_malformed_recipient() {
        let inputs = vec![input(0xaa, 0, 100_000)];
        let err = build_transfer_psbt(&inputs, "not-an-address", 1_000, CHANGE, 500, Network::Mainnet)
            .unwrap_err();
        assert_eq!(err, WalletError::InvalidAddress);
    }

    #[test]
    fn rejects_wrong_network_recipient() {
        let inputs = vec![input(0xaa, 0, 100_000)];
        // Testnet bech32 address on mainnet.
        let err = build_transfer_psbt(
            &inputs,
            "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx",
            1_000,
            CHANGE,
            500,
            Network::Mainnet,
        )
        .unwrap_err();
        assert_eq!(err, WalletError::InvalidAddress);
    }

    #[test]
    fn fixed_fee_ignores_shape() {
        let fee = FixedFee::default();
        assert_eq!(fee.fee_sats(1, 2), config::constants::DEFAULT_FEE_SATS);
        assert_eq!(fee.fee_sats(50, 1), config::constants::DEFAULT_FEE_SATS);
    }

    #[test]
    fn round_trips_a_raw_transaction() {
        let inputs = vec![input(0xaa, 0, 100_000)];
        let transfer =
            build_transfer_psbt(&inputs, RECIPIENT, 50_000, CHANGE, 500, Network::Mainnet)
                .unwrap();
        let bytes = bitcoin::consensus::encode::serialize(&transfer.psbt.unsigned_tx);
        let parsed = parse_raw_tx(&hex::encode(bytes)).unwrap();
        assert_eq!(parsed, transfer.psbt.unsigned_tx);
    }
}
