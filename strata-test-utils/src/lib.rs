//! STRATA Test Utilities
//!
//! Shared test infrastructure for the STRATA workspace:
//! - A deterministic mock recording model
//! - Canned field providers covering both tiers
//! - Re-exports of the types tests touch most

pub use strata_core::{
    CacheError, CacheResult, ChangeKind, ClusterId, ClusteringChange, FieldMap, FieldName,
    FieldValue, Location, Matrix, MemberIndex, RegistryError, ShapeError, StoreError,
};
pub use strata_store::{ClusterCache, DataModel, FieldProvider, StoreConfig, TieredStore};

// ============================================================================
// MOCK MODEL
// ============================================================================

/// Deterministic stand-in for an upstream recording.
///
/// Every observable is a pure function of the member index, so tests can
/// predict exactly what a provider should have cached.
#[derive(Debug, Clone)]
pub struct MockRecording {
    name: String,
    waveform_width: usize,
}

impl MockRecording {
    pub fn new(name: impl Into<String>, waveform_width: usize) -> Self {
        Self {
            name: name.into(),
            waveform_width,
        }
    }

    pub fn waveform_width(&self) -> usize {
        self.waveform_width
    }

    /// Synthetic per-member amplitude.
    pub fn amplitude(&self, member: MemberIndex) -> f32 {
        member as f32 * 0.5 + 1.0
    }

    /// Synthetic per-member waveform row; the first sample is the member
    /// index itself, which makes row ordering visible in assertions.
    pub fn waveform(&self, member: MemberIndex) -> Vec<f32> {
        (0..self.waveform_width)
            .map(|sample| member as f32 + sample as f32 * 0.25)
            .collect()
    }
}

impl DataModel for MockRecording {
    fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// CANNED PROVIDERS
// ============================================================================

/// Memory-tier provider caching one amplitude per member.
#[derive(Debug, Default)]
pub struct AmplitudeProvider;

impl FieldProvider<MockRecording> for AmplitudeProvider {
    fn name(&self) -> &str {
        "amplitude"
    }

    fn fields(&self) -> Vec<(FieldName, Location)> {
        vec![("amplitude".to_string(), Location::Memory)]
    }

    fn compute_and_store(
        &mut self,
        model: &MockRecording,
        store: &mut TieredStore,
        cluster: ClusterId,
        members: &[MemberIndex],
    ) -> CacheResult<()> {
        let value = FieldValue::Vector(members.iter().map(|&m| model.amplitude(m)).collect());
        let mut fields = FieldMap::new();
        fields.insert("amplitude".to_string(), value);
        store.store(cluster, None, fields)
    }
}

/// Memory-tier provider caching one mean amplitude per cluster.
#[derive(Debug, Default)]
pub struct MeanAmplitudeProvider;

impl FieldProvider<MockRecording> for MeanAmplitudeProvider {
    fn name(&self) -> &str {
        "mean_amplitude"
    }

    fn fields(&self) -> Vec<(FieldName, Location)> {
        vec![("mean_amplitude".to_string(), Location::Memory)]
    }

    fn compute_and_store(
        &mut self,
        model: &MockRecording,
        store: &mut TieredStore,
        cluster: ClusterId,
        members: &[MemberIndex],
    ) -> CacheResult<()> {
        let mean = if members.is_empty() {
            0.0
        } else {
            members.iter().map(|&m| model.amplitude(m) as f64).sum::<f64>() / members.len() as f64
        };
        let mut fields = FieldMap::new();
        fields.insert("mean_amplitude".to_string(), FieldValue::Scalar(mean));
        store.store(cluster, None, fields)
    }
}

/// Disk-tier provider caching one waveform row per member.
#[derive(Debug, Default)]
pub struct WaveformProvider;

impl FieldProvider<MockRecording> for WaveformProvider {
    fn name(&self) -> &str {
        "waveform"
    }

    fn fields(&self) -> Vec<(FieldName, Location)> {
        vec![("waveform".to_string(), Location::Disk)]
    }

    fn compute_and_store(
        &mut self,
        model: &MockRecording,
        store: &mut TieredStore,
        cluster: ClusterId,
        members: &[MemberIndex],
    ) -> CacheResult<()> {
        let rows: Vec<Vec<f32>> = members.iter().map(|&m| model.waveform(m)).collect();
        let row_slices: Vec<&[f32]> = rows.iter().map(|r| r.as_slice()).collect();
        let matrix = Matrix::from_rows(model.waveform_width(), &row_slices)?;
        let mut fields = FieldMap::new();
        fields.insert("waveform".to_string(), FieldValue::Matrix(matrix));
        store.store(cluster, None, fields)
    }
}
