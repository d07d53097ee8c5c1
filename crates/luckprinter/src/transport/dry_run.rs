//! Transport that records writes instead of sending them.

use async_trait::async_trait;

use super::Transport;
use crate::Result;

/// Records every write in order. Nothing leaves the process.
#[derive(Debug, Default)]
pub struct DryRunTransport {
    open: bool,
    writes: Vec<Vec<u8>>,
}

impl DryRunTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Each write call's bytes, in call order.
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    /// The whole recorded stream as it would appear on the wire.
    pub fn bytes(&self) -> Vec<u8> {
        self.writes.concat()
    }
}

#[async_trait]
impl Transport for DryRunTransport {
    async fn open(&mut self) -> Result<()> {
        tracing::info!("Dry run: transport opened");
        self.open = true;
        Ok(())
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        tracing::debug!(
            index = self.writes.len(),
            len = data.len(),
            "Dry run: recorded write"
        );
        self.writes.push(data.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        tracing::info!(
            write_count = self.writes.len(),
            total_bytes = self.writes.iter().map(Vec::len).sum::<usize>(),
            "Dry run: transport closed"
        );
        self.open = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_writes_in_order() {
        let mut t = DryRunTransport::new();
        t.open().await.unwrap();
        assert!(t.is_open());

        t.write(&[1, 2]).await.unwrap();
        t.write(&[3]).await.unwrap();
        t.close().await.unwrap();

        assert!(!t.is_open());
        assert_eq!(t.writes(), &[vec![1u8, 2], vec![3u8]]);
        assert_eq!(t.bytes(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_boxed_transport_delegates() {
        let mut boxed: Box<dyn Transport> = Box::new(DryRunTransport::new());
        boxed.open().await.unwrap();
        boxed.write(&[0xaa]).await.unwrap();
        boxed.close().await.unwrap();
    }
}
