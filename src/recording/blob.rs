/// A finished recording: all chunks concatenated in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingBlob {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl RecordingBlob {
    pub fn from_chunks(chunks: Vec<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        let total = chunks.iter().map(Vec::len).sum();
        let mut data = Vec::with_capacity(total);
        for chunk in chunks {
            data.extend_from_slice(&chunk);
        }

        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
