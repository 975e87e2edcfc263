// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT
use async_compression::tokio::bufread::GzipDecoder;
use bytes::{Buf, Bytes};
use cid::Cid;
use futures::{Stream, StreamExt};
use integer_encoding::VarInt;
use nunny::Vec as NonEmpty;
use pin_project_lite::pin_project;
use serde::{Deserialize, Serialize};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead};
use tokio_util::codec::FramedRead;
use tokio_util::either::Either;
use unsigned_varint::codec::UviBytes;

use crate::utils::cid::verify_block;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CarV1Header {
    // The roots array must contain one or more CIDs,
    // each of which should be present somewhere in the remainder of the CAR.
    // See <https://ipld.io/specs/transport/car/carv1/#constraints>
    pub roots: NonEmpty<Cid>,
    pub version: u64,
}

impl CarV1Header {
    pub fn new(roots: NonEmpty<Cid>) -> Self {
        Self { roots, version: 1 }
    }

    /// Writes the varint-framed DAG-CBOR header.
    pub fn write(&self, writer: &mut impl io::Write) -> io::Result<()> {
        let bytes = fvm_ipld_encoding::to_vec(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writer.write_all(&bytes.len().encode_var_vec())?;
        writer.write_all(&bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CarBlock {
    pub cid: Cid,
    pub data: Vec<u8>,
}

impl CarBlock {
    // Write a varint frame containing the cid and the data
    pub fn write(&self, mut writer: &mut impl io::Write) -> io::Result<()> {
        let frame_length = self.cid.encoded_len() + self.data.len();
        writer.write_all(&frame_length.encode_var_vec())?;
        #[allow(clippy::needless_borrows_for_generic_args)]
        self.cid
            .write_bytes(&mut writer)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writer.write_all(&self.data)?;
        Ok(())
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> io::Result<CarBlock> {
        let bytes: Bytes = bytes.into();
        let mut cursor = bytes.reader();
        let cid = Cid::read_bytes(&mut cursor)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let bytes = cursor.into_inner();
        Ok(CarBlock {
            cid,
            data: bytes.to_vec(),
        })
    }

    pub fn valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        verify_block(&self.cid, &self.data)
    }
}

pin_project! {
    /// Stream of CAR blocks. If the input data is compressed with gzip, it will
    /// automatically be decompressed.
    pub struct CarStream<ReaderT> {
        #[pin]
        reader: FramedRead<Either<ReaderT, GzipDecoder<ReaderT>>, UviBytes>,
        pub header: CarV1Header,
        first_block: Option<CarBlock>,
    }
}

/// Every gzip member starts with these two bytes.
/// See <https://www.rfc-editor.org/rfc/rfc1952#page-6>
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

fn is_gzip(buf: &[u8]) -> bool {
    buf.starts_with(&GZIP_MAGIC)
}

impl<ReaderT: AsyncBufRead + Unpin> CarStream<ReaderT> {
    pub async fn new(mut reader: ReaderT) -> io::Result<Self> {
        let is_compressed = is_gzip(reader.fill_buf().await?);
        let mut reader = if is_compressed {
            let mut gzip = GzipDecoder::new(reader);
            gzip.multiple_members(true);
            FramedRead::new(Either::Right(gzip), UviBytes::default())
        } else {
            FramedRead::new(Either::Left(reader), UviBytes::default())
        };
        let header = read_v1_header(&mut reader)
            .await
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "invalid header block"))?;

        // Read the first block and check if it is valid. This check helps to
        // catch invalid CAR files as soon as we open.
        let first_block = match reader.next().await.transpose()? {
            Some(first_entry) => {
                let block = CarBlock::from_bytes(first_entry)?;
                if !block.valid() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "invalid first block",
                    ));
                }
                Some(block)
            }
            None => None,
        };
        Ok(CarStream {
            reader,
            header,
            first_block,
        })
    }
}

impl<ReaderT: AsyncBufRead> Stream for CarStream<ReaderT> {
    type Item = io::Result<CarBlock>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if let Some(block) = this.first_block.take() {
            return Poll::Ready(Some(Ok(block)));
        }
        let item = futures::ready!(this.reader.poll_next(cx));
        Poll::Ready(item.map(|ret| ret.and_then(CarBlock::from_bytes)))
    }
}

async fn read_v1_header<ReaderT: AsyncRead + Unpin>(
    framed_reader: &mut FramedRead<ReaderT, UviBytes>,
) -> Option<CarV1Header> {
    let frame = framed_reader.next().await?.ok()?;
    let header = fvm_ipld_encoding::from_slice::<CarV1Header>(&frame).ok()?;
    if header.version != 1 {
        return None;
    }
    Some(header)
}
