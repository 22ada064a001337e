//! Read-only views of the model for presentation layers.

use confix_edit::ConfigModel;
use confix_types::{Diagnosis, FixRow, RequestStatus, ValueRequest};

/// Current standing of each request, in request order.
pub fn request_status<M: ConfigModel>(model: &M, requests: &[ValueRequest]) -> Vec<RequestStatus> {
    requests
        .iter()
        .map(|r| RequestStatus::new(r.clone(), model.current_value(r.symbol())))
        .collect()
}

/// Each fix of `diagnosis` next to the value it would replace.
pub fn fix_rows<M: ConfigModel>(model: &M, diagnosis: &Diagnosis) -> Vec<FixRow> {
    diagnosis
        .iter()
        .map(|fix| FixRow {
            symbol: fix.symbol().clone(),
            current: model.current_value(fix.symbol()),
            desired: fix.desired().clone(),
        })
        .collect()
}

/// True when every request already holds.
pub fn requests_met<M: ConfigModel>(model: &M, requests: &[ValueRequest]) -> bool {
    requests
        .iter()
        .all(|r| r.is_met_by(&model.current_value(r.symbol())))
}
