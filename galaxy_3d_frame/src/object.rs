/// Generic object base
///
/// Storage for parameters no specialized object claims, plus commit
/// bookkeeping. Specialized objects (such as `RenderTarget`) intercept the
/// names they understand and delegate everything else here.

use rustc_hash::FxHashMap;
use crate::data_type::DataType;
use crate::param::{ParamValue, PropertyValue};
use crate::{frame_debug, frame_trace};

pub struct ObjectBase {
    /// Object kind, used as log source suffix (e.g. "RenderTarget")
    kind: &'static str,
    params: FxHashMap<String, ParamValue>,
    uncommitted: bool,
    commit_count: u64,
}

impl ObjectBase {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            params: FxHashMap::default(),
            uncommitted: false,
            commit_count: 0,
        }
    }

    /// Store a parameter, replacing any previous value of the same name
    pub fn set_param(&mut self, name: &str, value: ParamValue) {
        let data_type = value.data_type();
        if data_type.is_object() {
            frame_debug!("galaxy3d::Object", "{}: '{}' holds a {:?} reference it does not use",
                self.kind, name, data_type);
        } else {
            frame_trace!("galaxy3d::Object", "{}: stored generic parameter '{}' ({:?})",
                self.kind, name, data_type);
        }
        self.params.insert(name.to_string(), value);
        self.uncommitted = true;
    }

    /// Remove a parameter; returns whether it existed
    pub fn unset_param(&mut self, name: &str) -> bool {
        let removed = self.params.remove(name).is_some();
        if removed {
            self.uncommitted = true;
        }
        removed
    }

    /// Get a stored parameter
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    /// Number of stored generic parameters
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Commit bookkeeping, run after the specialized object's own commit
    pub fn commit(&mut self) {
        if self.has_uncommitted_params() {
            frame_trace!("galaxy3d::Object", "{}: committed {} generic parameters",
                self.kind, self.param_count());
        }
        self.commit_count += 1;
        self.uncommitted = false;
    }

    pub fn commit_count(&self) -> u64 {
        self.commit_count
    }

    /// Whether generic parameters changed since the last commit
    pub fn has_uncommitted_params(&self) -> bool {
        self.uncommitted
    }

    /// Property fallback
    ///
    /// The base object publishes no properties of its own.
    pub fn property(&self, name: &str, data_type: DataType) -> Option<PropertyValue> {
        frame_trace!("galaxy3d::Object", "{}: unsupported property '{}' ({:?})",
            self.kind, name, data_type);
        None
    }
}
