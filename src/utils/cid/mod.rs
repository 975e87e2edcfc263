// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use fvm_ipld_encoding::Error;
use multihash_codetable::{Code, MultihashDigest as _};

/// Multihash code of the identity "hash", whose digest is the data itself.
pub const IDENTITY_HASH: u64 = 0x0;

/// Extension methods for constructing `dag-cbor` [Cid]
#[cfg(test)]
pub trait CidCborExt {
    /// Default CID builder for Filecoin
    ///
    /// - The default codec is [`fvm_ipld_encoding::DAG_CBOR`]
    /// - The default hash function is 256 bit BLAKE2b
    ///
    /// This matches [`abi.CidBuilder`](https://github.com/filecoin-project/go-state-types/blob/master/abi/cid.go#L49) in go
    fn from_cbor_blake2b256<S: serde::ser::Serialize>(obj: &S) -> Result<Cid, Error> {
        let bytes = fvm_ipld_encoding::to_vec(obj)?;
        Ok(Cid::new_v1(
            fvm_ipld_encoding::DAG_CBOR,
            Code::Blake2b256.digest(&bytes),
        ))
    }
}

#[cfg(test)]
impl CidCborExt for Cid {}

/// Identity CIDs carry their payload inline and never live in a block store.
pub fn is_identity(cid: &Cid) -> bool {
    cid.hash().code() == IDENTITY_HASH
}

/// Whether `cid` names a block a node can serve. Only `dag-cbor` and `raw` qualify;
/// the latter for actor code. Links with other codecs, such as sector commitments,
/// are opaque identifiers.
pub fn is_stored_block(cid: &Cid) -> bool {
    !is_identity(cid)
        && matches!(
            cid.codec(),
            fvm_ipld_encoding::DAG_CBOR | fvm_ipld_encoding::IPLD_RAW
        )
}

/// Checks that `data` hashes to `cid`. Identity CIDs are compared against their inline digest.
pub fn verify_block(cid: &Cid, data: &[u8]) -> anyhow::Result<()> {
    if is_identity(cid) {
        anyhow::ensure!(
            cid.hash().digest() == data,
            "identity CID {cid} does not match its data"
        );
        return Ok(());
    }
    let code = Code::try_from(cid.hash().code())?;
    let actual = Cid::new_v1(cid.codec(), code.digest(data));
    anyhow::ensure!(
        actual.hash() == cid.hash(),
        "CID/Block mismatch for block {cid}, actual: {actual}"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cbor_cid_is_deterministic() {
        let a = Cid::from_cbor_blake2b256(&(1u64, "hello")).unwrap();
        let b = Cid::from_cbor_blake2b256(&(1u64, "hello")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.codec(), fvm_ipld_encoding::DAG_CBOR);
        verify_block(&a, &fvm_ipld_encoding::to_vec(&(1u64, "hello")).unwrap()).unwrap();
    }

    #[test]
    fn only_cbor_and_raw_blocks_are_stored() {
        let digest = Code::Sha2_256.digest(b"commr");
        assert!(is_stored_block(&Cid::new_v1(fvm_ipld_encoding::DAG_CBOR, digest)));
        assert!(is_stored_block(&Cid::new_v1(fvm_ipld_encoding::IPLD_RAW, digest)));
        // sealed and unsealed sector commitments
        assert!(!is_stored_block(&Cid::new_v1(0xf102, digest)));
        assert!(!is_stored_block(&Cid::new_v1(0xf101, digest)));
        let inline = cid::multihash::Multihash::wrap(IDENTITY_HASH, b"inline").unwrap();
        assert!(!is_stored_block(&Cid::new_v1(fvm_ipld_encoding::DAG_CBOR, inline)));
    }

    #[test]
    fn verify_rejects_tampered_block() {
        let cid = Cid::from_cbor_blake2b256(&"payload").unwrap();
        assert!(verify_block(&cid, b"something else").is_err());
    }
}
