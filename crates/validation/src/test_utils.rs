//! Fixtures for exercising the engine: deterministic keys, transaction
//! builders and a small in-memory chain.

use bitcoin::{
    Amount, EcdsaSighashType, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid,
    Witness, absolute::LockTime, ecdsa, hashes::Hash, sighash::SighashCache,
    transaction::Version,
};
use keystone_admin_state::{AdminState, StateDelta};
use keystone_params::{
    ChainParams, DEFAULT_ASP_BASE_KEY_ID, DEFAULT_COINBASE_MATURITY, DEFAULT_MAX_FEE,
    DEFAULT_MAX_MONEY, DEFAULT_MIN_THREAD_KEYS, GenesisThreadTips,
};
use keystone_primitives::{AdminPubkey, KeyId, OutputRef, ThreadId};
use keystone_script::{Address, AdminOperation, null_data_script, thread_script};
use secp256k1::{Message, PublicKey, SECP256K1, SecretKey};

use crate::{
    engine::{ConnectedBlock, apply_block, validate_for_mempool},
    errors::{BlockRejection, RejectReason},
    utxo::{MemUtxoView, UtxoEntry},
};

/// Seeds of the genesis root keys. They are also the ASP keys with ids 1
/// and 2.
pub const ROOT_SEEDS: [u8; 2] = [1, 2];

pub const PROVISION_SEEDS: [u8; 2] = [3, 4];

pub const ISSUE_SEEDS: [u8; 2] = [5, 6];

/// Signing key derived from a one-byte seed.
#[derive(Clone, Debug)]
pub struct TestKey {
    secret: SecretKey,
}

impl TestKey {
    /// Panics on seed 0, which is not a valid secret.
    pub fn from_seed(seed: u8) -> Self {
        let secret = SecretKey::from_slice(&[seed; 32]).expect("test: nonzero seed");
        Self { secret }
    }

    pub fn pubkey(&self) -> AdminPubkey {
        PublicKey::from_secret_key(SECP256K1, &self.secret).into()
    }

    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }
}

fn keys(seeds: [u8; 2]) -> Vec<TestKey> {
    seeds.into_iter().map(TestKey::from_seed).collect()
}

/// Unsigned version 2 transaction spending `inputs`.
pub fn spend_tx(inputs: Vec<OutPoint>, outputs: Vec<TxOut>) -> Transaction {
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: inputs
            .into_iter()
            .map(|previous_output| TxIn {
                previous_output,
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            })
            .collect(),
        output: outputs,
    }
}

/// Replaces the witness of input `input` with a signature from each of
/// `signers`, in order.
pub fn sign_input(tx: &mut Transaction, input: usize, prevout: &TxOut, signers: &[&TestKey]) {
    let sighash = SighashCache::new(&*tx)
        .p2wsh_signature_hash(
            input,
            &prevout.script_pubkey,
            prevout.value,
            EcdsaSighashType::All,
        )
        .expect("test: input in range");
    let msg = Message::from_digest(sighash.to_byte_array());

    let mut witness = Witness::new();
    for key in signers {
        let sig = ecdsa::Signature {
            signature: SECP256K1.sign_ecdsa(&msg, key.secret()),
            sighash_type: EcdsaSighashType::All,
        };
        witness.push(key.pubkey().to_bytes());
        witness.push(sig.to_vec());
    }
    tx.input[input].witness = witness;
}

pub fn thread_out(thread: ThreadId) -> TxOut {
    TxOut {
        value: Amount::ZERO,
        script_pubkey: thread_script(thread),
    }
}

/// The output a thread tip is signed against.
pub fn thread_prevout(thread: ThreadId) -> TxOut {
    thread_out(thread)
}

pub fn op_out(op: AdminOperation) -> TxOut {
    TxOut {
        value: Amount::ZERO,
        script_pubkey: op.to_script(),
    }
}

/// Address output owned by `owner` and co-signable by the ASP keys `ids`.
pub fn addr_out(owner: &TestKey, ids: [u32; 2], sat: u64) -> TxOut {
    TxOut {
        value: Amount::from_sat(sat),
        script_pubkey: Address::new(owner.pubkey().key_hash(), ids.map(KeyId::new)).to_script(),
    }
}

pub fn burn_out(sat: u64) -> TxOut {
    TxOut {
        value: Amount::from_sat(sat),
        script_pubkey: null_data_script(&[]).expect("test: empty payload fits"),
    }
}

/// Params with two root keys doubling as ASP keys 1 and 2, two provision
/// keys and two issue keys.
pub fn test_params() -> ChainParams {
    let pks = |seeds: [u8; 2]| -> Vec<AdminPubkey> {
        keys(seeds).iter().map(TestKey::pubkey).collect()
    };
    let tip = |n: u8| OutputRef::new(Txid::from_byte_array([n; 32]), 0);
    let params = ChainParams {
        root_keys: pks(ROOT_SEEDS),
        genesis_asp_keys: pks(ROOT_SEEDS),
        genesis_provision_keys: pks(PROVISION_SEEDS),
        genesis_issue_keys: pks(ISSUE_SEEDS),
        genesis_validate_keys: Vec::new(),
        genesis_thread_tips: GenesisThreadTips {
            root: tip(0xa1),
            provision: tip(0xa2),
            issue: tip(0xa3),
        },
        max_money: DEFAULT_MAX_MONEY,
        max_fee: DEFAULT_MAX_FEE,
        coinbase_maturity: DEFAULT_COINBASE_MATURITY,
        min_thread_keys: DEFAULT_MIN_THREAD_KEYS,
        asp_base_key_id: DEFAULT_ASP_BASE_KEY_ID,
    };
    params.check_well_formed().expect("test: params well formed");
    params
}

/// In-memory chain driven through the engine entry points.
#[derive(Debug)]
pub struct TestChain {
    pub params: ChainParams,
    pub state: AdminState,
    pub utxos: MemUtxoView,
    coinbases: u32,
}

impl TestChain {
    pub fn new() -> Self {
        let params = test_params();
        let state = AdminState::genesis(&params).expect("test: genesis");
        Self {
            params,
            state,
            utxos: MemUtxoView::new(),
            coinbases: 0,
        }
    }

    /// Keys that must all sign for `thread` at genesis.
    pub fn thread_keys(thread: ThreadId) -> Vec<TestKey> {
        match thread {
            ThreadId::Root => keys(ROOT_SEEDS),
            ThreadId::Provision => keys(PROVISION_SEEDS),
            ThreadId::Issue => keys(ISSUE_SEEDS),
        }
    }

    pub fn tip(&self, thread: ThreadId) -> OutPoint {
        self.state.registry().current_tip(thread).into()
    }

    /// Admin transaction spending only the current tip of `thread`, with the
    /// thread output prepended to `outputs`, signed by `signers`.
    pub fn admin_tx(
        &self,
        thread: ThreadId,
        outputs: Vec<TxOut>,
        signers: &[&TestKey],
    ) -> Transaction {
        let mut all = vec![thread_out(thread)];
        all.extend(outputs);
        let mut tx = spend_tx(vec![self.tip(thread)], all);
        sign_input(&mut tx, 0, &thread_prevout(thread), signers);
        tx
    }

    /// Like [`Self::admin_tx`], signed by the genesis keys of the thread.
    pub fn signed_admin_tx(&self, thread: ThreadId, outputs: Vec<TxOut>) -> Transaction {
        let keys = Self::thread_keys(thread);
        let signers: Vec<&TestKey> = keys.iter().collect();
        self.admin_tx(thread, outputs, &signers)
    }

    /// Mempool check against the current tip.
    pub fn submit(&self, tx: &Transaction) -> Result<(), RejectReason> {
        validate_for_mempool(tx, &self.state, &self.utxos, &self.params)
    }

    /// Connects a block holding `txs` and updates the UTXO set.
    pub fn mine(&mut self, txs: &[Transaction]) -> Result<Vec<StateDelta>, BlockRejection> {
        self.mine_block(txs).map(|block| block.deltas)
    }

    /// Like [`Self::mine`], returning the whole block outcome.
    pub fn mine_block(&mut self, txs: &[Transaction]) -> Result<ConnectedBlock, BlockRejection> {
        let block = apply_block(txs, &mut self.state, &self.utxos, &self.params)?;
        let height = self.state.height();
        for tx in txs {
            self.utxos.connect_tx(tx, height);
        }
        Ok(block)
    }

    /// Adds a coinbase output at the current height and returns its outpoint.
    pub fn add_coinbase(&mut self, output: TxOut) -> OutPoint {
        self.coinbases += 1;
        let mut tx = spend_tx(vec![OutPoint::null()], vec![output]);
        tx.input[0].script_sig = ScriptBuf::builder()
            .push_int(i64::from(self.coinbases))
            .into_script();
        self.utxos.connect_tx(&tx, self.state.height());
        OutPoint::new(tx.compute_txid(), 0)
    }

    /// Inserts a non-coinbase output at the current height.
    pub fn add_utxo(&mut self, outpoint: OutPoint, output: TxOut) {
        let height = self.state.height();
        self.utxos.insert(
            outpoint,
            UtxoEntry {
                output,
                height,
                is_coinbase: false,
            },
        );
    }
}

impl Default for TestChain {
    fn default() -> Self {
        Self::new()
    }
}
