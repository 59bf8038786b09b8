use k8s_openapi::api::autoscaling::v1::{Scale, ScaleSpec};

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum ReplicaError {
    #[error("invalid replica count {0:?}: expected a 32-bit integer")]
    Invalid(String),
    #[error("No changes applied")]
    NoChange,
}

pub fn parse_replicas(raw: &str) -> Result<i32, ReplicaError> {
    raw.parse::<i32>()
        .map_err(|_| ReplicaError::Invalid(raw.to_string()))
}

/// Desired count recorded on a scale subresource. An omitted field means zero.
pub fn current_replicas(scale: &Scale) -> i32 {
    scale
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .unwrap_or(0)
}

/// Decides the new desired count. Negative counts and counts equal to the
/// current one are rejected.
pub fn plan_scale(current: i32, requested: i32) -> Result<i32, ReplicaError> {
    if requested < 0 || requested == current {
        Err(ReplicaError::NoChange)
    } else {
        Ok(requested)
    }
}

/// Fetched scale with its spec rewritten to `replicas`. Metadata, including
/// the resource version, is carried over so the write is rejected if the
/// object changed in between.
pub fn with_replicas(mut scale: Scale, replicas: i32) -> Scale {
    let spec = scale.spec.get_or_insert_with(ScaleSpec::default);
    spec.replicas = Some(replicas);
    scale
}
