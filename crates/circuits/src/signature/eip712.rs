//! EIP-712 typed-struct encoding of transactions and offers.
//!
//! Every struct member is a single 32-byte word, so `encodeData` is the
//! concatenation of the type hash and one word per field element. Type
//! strings and their hashes are built once per process.

use ark_bn254::Fr;
use lazy_static::lazy_static;
use sha3::{Digest, Keccak256};

use crate::config::Eip712Domain;
use crate::error::HintError;
use crate::field::{fr_from_bytes_be, fr_to_bytes_be};
use crate::model::Offer;
use crate::tx::TxType;

const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

pub const OFFER_TYPE: &str = "Offer(uint256 Type,uint256 OfferId,uint256 AccountIndex,uint256 NftIndex,\
uint256 AssetId,uint256 AssetAmount,uint256 ListedAt,uint256 ExpiredAt,uint256 TreasuryRate,uint256 ChainId)";

/// Members appended to every transaction struct.
const TX_SUFFIX: [&str; 3] = ["uint256 ExpiredAt", "uint256 Nonce", "uint256 ChainId"];

/// Struct members in the order the type's hash fields are produced.
fn members(tx_type: TxType) -> &'static [&'static str] {
    match tx_type {
        TxType::Empty => &[],
        TxType::RegisterZns => &[
            "uint256 AccountIndex",
            "bytes32 AccountName",
            "bytes32 AccountNameHash",
            "uint256 PubKeyHi",
            "uint256 PubKeyLo",
        ],
        TxType::CreatePair => &[
            "uint256 PairIndex",
            "uint256 AssetAId",
            "uint256 AssetBId",
            "uint256 FeeRate",
            "uint256 TreasuryAccountIndex",
            "uint256 TreasuryRate",
        ],
        TxType::UpdatePairRate => &[
            "uint256 PairIndex",
            "uint256 FeeRate",
            "uint256 TreasuryAccountIndex",
            "uint256 TreasuryRate",
        ],
        TxType::Deposit => &[
            "uint256 AccountIndex",
            "bytes32 AccountNameHash",
            "uint256 AssetId",
            "uint256 AssetAmount",
        ],
        TxType::DepositNft => &[
            "uint256 AccountIndex",
            "bytes32 AccountNameHash",
            "uint256 NftIndex",
            "uint256 CreatorAccountIndex",
            "uint256 CreatorTreasuryRate",
            "uint256 CollectionId",
            "bytes32 NftContentHash",
            "address NftL1Address",
            "uint256 NftL1TokenId",
        ],
        TxType::Transfer => &[
            "uint256 FromAccountIndex",
            "uint256 ToAccountIndex",
            "bytes32 ToAccountNameHash",
            "uint256 AssetId",
            "uint256 AssetAmount",
            "uint256 GasAccountIndex",
            "uint256 GasFeeAssetId",
            "uint256 GasFeeAssetAmount",
            "bytes32 CallDataHash",
        ],
        TxType::Swap => &[
            "uint256 FromAccountIndex",
            "uint256 PairIndex",
            "uint256 AssetAId",
            "uint256 AssetAAmount",
            "uint256 AssetBId",
            "uint256 AssetBMinAmount",
            "uint256 AssetBAmountDelta",
            "uint256 GasAccountIndex",
            "uint256 GasFeeAssetId",
            "uint256 GasFeeAssetAmount",
        ],
        TxType::AddLiquidity => &[
            "uint256 FromAccountIndex",
            "uint256 PairIndex",
            "uint256 AssetAId",
            "uint256 AssetAAmount",
            "uint256 AssetBId",
            "uint256 AssetBAmount",
            "uint256 LpAmount",
            "uint256 TreasuryAmount",
            "uint256 KLast",
            "uint256 GasAccountIndex",
            "uint256 GasFeeAssetId",
            "uint256 GasFeeAssetAmount",
        ],
        TxType::RemoveLiquidity => &[
            "uint256 FromAccountIndex",
            "uint256 PairIndex",
            "uint256 AssetAId",
            "uint256 AssetAMinAmount",
            "uint256 AssetBId",
            "uint256 AssetBMinAmount",
            "uint256 LpAmount",
            "uint256 AssetAAmountDelta",
            "uint256 AssetBAmountDelta",
            "uint256 TreasuryAmount",
            "uint256 KLast",
            "uint256 GasAccountIndex",
            "uint256 GasFeeAssetId",
            "uint256 GasFeeAssetAmount",
        ],
        TxType::Withdraw => &[
            "uint256 FromAccountIndex",
            "uint256 AssetId",
            "uint256 AssetAmount",
            "address ToAddress",
            "uint256 GasAccountIndex",
            "uint256 GasFeeAssetId",
            "uint256 GasFeeAssetAmount",
        ],
        TxType::CreateCollection => &[
            "uint256 AccountIndex",
            "uint256 CollectionId",
            "uint256 GasAccountIndex",
            "uint256 GasFeeAssetId",
            "uint256 GasFeeAssetAmount",
        ],
        TxType::MintNft => &[
            "uint256 CreatorAccountIndex",
            "uint256 ToAccountIndex",
            "bytes32 ToAccountNameHash",
            "uint256 NftIndex",
            "bytes32 NftContentHash",
            "uint256 CreatorTreasuryRate",
            "uint256 CollectionId",
            "uint256 GasAccountIndex",
            "uint256 GasFeeAssetId",
            "uint256 GasFeeAssetAmount",
        ],
        TxType::TransferNft => &[
            "uint256 FromAccountIndex",
            "uint256 ToAccountIndex",
            "bytes32 ToAccountNameHash",
            "uint256 NftIndex",
            "uint256 GasAccountIndex",
            "uint256 GasFeeAssetId",
            "uint256 GasFeeAssetAmount",
            "bytes32 CallDataHash",
        ],
        TxType::AtomicMatch => &[
            "uint256 AccountIndex",
            "bytes32 BuyOfferHash",
            "bytes32 SellOfferHash",
            "uint256 CreatorAmount",
            "uint256 TreasuryAmount",
            "uint256 GasAccountIndex",
            "uint256 GasFeeAssetId",
            "uint256 GasFeeAssetAmount",
        ],
        TxType::CancelOffer => &[
            "uint256 AccountIndex",
            "uint256 OfferId",
            "uint256 GasAccountIndex",
            "uint256 GasFeeAssetId",
            "uint256 GasFeeAssetAmount",
        ],
        TxType::WithdrawNft => &[
            "uint256 AccountIndex",
            "uint256 CreatorAccountIndex",
            "bytes32 CreatorAccountNameHash",
            "uint256 NftIndex",
            "bytes32 NftContentHash",
            "address NftL1Address",
            "uint256 NftL1TokenId",
            "uint256 CreatorTreasuryRate",
            "uint256 CollectionId",
            "address ToAddress",
            "uint256 GasAccountIndex",
            "uint256 GasFeeAssetId",
            "uint256 GasFeeAssetAmount",
        ],
        TxType::FullExit => &[
            "uint256 AccountIndex",
            "bytes32 AccountNameHash",
            "uint256 AssetId",
            "uint256 AssetAmount",
        ],
        TxType::FullExitNft => &[
            "uint256 AccountIndex",
            "bytes32 AccountNameHash",
            "uint256 CreatorAccountIndex",
            "bytes32 CreatorAccountNameHash",
            "uint256 NftIndex",
            "uint256 CreatorTreasuryRate",
            "uint256 CollectionId",
            "bytes32 NftContentHash",
            "address NftL1Address",
            "uint256 NftL1TokenId",
        ],
    }
}

struct TypedStruct {
    type_string: String,
    type_hash: [u8; 32],
    members: usize,
}

impl TypedStruct {
    fn new(type_string: String) -> Self {
        let members = type_string
            .split_once('(')
            .map(|(_, body)| body.trim_end_matches(')').split(',').count())
            .unwrap_or(0);
        Self {
            type_hash: keccak256(type_string.as_bytes()),
            type_string,
            members,
        }
    }

    /// `keccak256(typeHash || words)`, checking the word count against the
    /// declared members.
    fn hash(&self, tx_type: TxType, words: &[[u8; 32]]) -> Result<[u8; 32], HintError> {
        if words.len() != self.members {
            return Err(HintError::AbiLayout {
                tx_type,
                expected: self.members,
                actual: words.len(),
            });
        }
        let mut hasher = Keccak256::new();
        hasher.update(self.type_hash);
        for word in words {
            hasher.update(word);
        }
        Ok(hasher.finalize().into())
    }
}

lazy_static! {
    static ref DOMAIN_TYPE_HASH: [u8; 32] = keccak256(DOMAIN_TYPE.as_bytes());
    static ref OFFER_STRUCT: TypedStruct = TypedStruct::new(OFFER_TYPE.to_string());
    static ref TX_STRUCTS: Vec<TypedStruct> = TxType::ALL
        .iter()
        .map(|tx_type| {
            let body: Vec<&str> = members(*tx_type).iter().chain(TX_SUFFIX.iter()).copied().collect();
            TypedStruct::new(format!("{:?}({})", tx_type, body.join(",")))
        })
        .collect();
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// The EIP-712 type string a transaction type is signed under.
pub fn type_string(tx_type: TxType) -> &'static str {
    &TX_STRUCTS[tx_type as usize].type_string
}

/// A digest reduced into the scalar field, the form the circuit carries.
pub fn digest_to_fr(digest: &[u8; 32]) -> Fr {
    fr_from_bytes_be(digest)
}

fn u64_word(value: u64) -> [u8; 32] {
    fr_to_bytes_be(&Fr::from(value))
}

/// Domain separator plus the chain id every struct repeats.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningDomain {
    separator: [u8; 32],
    chain_id: u64,
}

impl SigningDomain {
    pub fn new(domain: &Eip712Domain) -> Self {
        let mut contract = [0u8; 32];
        contract[12..].copy_from_slice(&domain.verifying_contract);
        let mut hasher = Keccak256::new();
        hasher.update(*DOMAIN_TYPE_HASH);
        hasher.update(keccak256(domain.name.as_bytes()));
        hasher.update(keccak256(domain.version.as_bytes()));
        hasher.update(u64_word(domain.chain_id));
        hasher.update(contract);
        Self {
            separator: hasher.finalize().into(),
            chain_id: domain.chain_id,
        }
    }

    pub fn separator(&self) -> &[u8; 32] {
        &self.separator
    }

    /// `keccak256("\x19\x01" || domainSeparator || structHash)`.
    fn signed_digest(&self, struct_hash: &[u8; 32]) -> [u8; 32] {
        let mut hasher = Keccak256::new();
        hasher.update([0x19, 0x01]);
        hasher.update(self.separator);
        hasher.update(struct_hash);
        hasher.finalize().into()
    }

    /// Digest a layer-2 signer signs for a transaction with the given
    /// (unpadded) hash fields.
    pub fn tx_digest(
        &self,
        tx_type: TxType,
        hash_fields: &[Fr],
        nonce: u64,
        expired_at: u64,
    ) -> Result<[u8; 32], HintError> {
        let words: Vec<[u8; 32]> = hash_fields
            .iter()
            .map(fr_to_bytes_be)
            .chain([u64_word(expired_at), u64_word(nonce), u64_word(self.chain_id)])
            .collect();
        let struct_hash = TX_STRUCTS[tx_type as usize].hash(tx_type, &words)?;
        Ok(self.signed_digest(&struct_hash))
    }

    pub fn offer_digest(&self, offer: &Offer) -> Result<[u8; 32], HintError> {
        let words: Vec<[u8; 32]> = offer
            .hash_fields()
            .iter()
            .map(fr_to_bytes_be)
            .chain([u64_word(self.chain_id)])
            .collect();
        let struct_hash = OFFER_STRUCT.hash(TxType::AtomicMatch, &words)?;
        Ok(self.signed_digest(&struct_hash))
    }
}
