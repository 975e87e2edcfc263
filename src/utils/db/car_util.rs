// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use anyhow::Context as _;
use cid::Cid;
use futures::TryStreamExt as _;
use fvm_ipld_blockstore::Blockstore;
use ipld_core::ipld::Ipld;
use nunny::Vec as NonEmpty;
use std::io;
use tokio::io::AsyncBufRead;

use crate::db::CidHashSet;
use crate::utils::cid::{is_identity, is_stored_block};
use crate::utils::db::car_stream::{CarBlock, CarStream, CarV1Header};

/// Stream key-value pairs from a CAR archive into a block store, checking every block
/// against its CID. The block store is not restored to its original state in case of errors.
pub async fn load_car<R>(db: &impl Blockstore, reader: R) -> anyhow::Result<CarV1Header>
where
    R: AsyncBufRead + Unpin,
{
    let mut stream = CarStream::new(reader).await?;
    while let Some(block) = stream.try_next().await? {
        block.validate()?;
        db.put_keyed(&block.cid, &block.data)?;
    }
    Ok(stream.header)
}

/// Writes every block reachable from `roots` as a `CARv1`.
///
/// `raw` blocks are included but not decoded. Identity CIDs and links that are not
/// `dag-cbor` or `raw` are skipped.
/// Returns the number of blocks written.
pub fn write_car(
    store: &impl Blockstore,
    roots: NonEmpty<Cid>,
    writer: &mut impl io::Write,
) -> anyhow::Result<usize> {
    write_car_filtered(store, roots, writer, |_| true)
}

/// Writes `roots` and the subset of their descendants listed in `include`.
///
/// Links outside `include` are neither written nor followed.
pub fn write_car_including(
    store: &impl Blockstore,
    roots: NonEmpty<Cid>,
    include: &CidHashSet,
    writer: &mut impl io::Write,
) -> anyhow::Result<usize> {
    write_car_filtered(store, roots, writer, |cid| include.contains(cid))
}

fn write_car_filtered(
    store: &impl Blockstore,
    roots: NonEmpty<Cid>,
    writer: &mut impl io::Write,
    follow: impl Fn(&Cid) -> bool,
) -> anyhow::Result<usize> {
    CarV1Header::new(roots.clone()).write(writer)?;

    let mut seen = CidHashSet::default();
    let mut written = 0;
    // Depth-first, first link first.
    let mut stack = roots.iter().rev().copied().collect::<Vec<_>>();
    let roots = roots.iter().copied().collect::<CidHashSet>();
    while let Some(cid) = stack.pop() {
        if is_identity(&cid) || !seen.insert(cid) {
            continue;
        }
        let data = store
            .get(&cid)?
            .with_context(|| format!("block {cid} is missing from the store"))?;
        if cid.codec() == fvm_ipld_encoding::DAG_CBOR {
            let links = extract_links(&data)
                .with_context(|| format!("failed to decode links of {cid}"))?;
            stack.extend(
                links
                    .into_iter()
                    .rev()
                    .filter(is_stored_block)
                    .filter(|link| roots.contains(link) || follow(link)),
            );
        }
        CarBlock { cid, data }.write(writer)?;
        written += 1;
    }
    Ok(written)
}

/// Returns the CIDs linked from a DAG-CBOR block, in encoding order.
pub fn extract_links(data: &[u8]) -> anyhow::Result<Vec<Cid>> {
    fn collect(ipld: &Ipld, links: &mut Vec<Cid>) {
        match ipld {
            Ipld::Link(cid) => links.push(*cid),
            Ipld::List(list) => list.iter().for_each(|it| collect(it, links)),
            Ipld::Map(map) => map.values().for_each(|it| collect(it, links)),
            _ => {}
        }
    }
    let ipld = fvm_ipld_encoding::from_slice::<Ipld>(data)?;
    let mut links = vec![];
    collect(&ipld, &mut links);
    Ok(links)
}
