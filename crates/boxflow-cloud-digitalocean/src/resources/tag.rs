use boxflow_cloud::{ApiErrorKind, CloudApi, CloudError, Deadline, Result};

/// Whether [`ensure`] had to create the tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagState {
    Existing,
    Created,
}

/// Make sure a tag exists. Only creates when the fetch reports it missing; a
/// 422 on create means another client created it in the meantime.
pub async fn ensure<A: CloudApi + ?Sized>(
    api: &A,
    name: &str,
    deadline: Deadline,
) -> Result<TagState> {
    tracing::debug!("GET /tags/{}", name);
    match api.get(&format!("/tags/{}", name), deadline).await {
        Ok(_) => return Ok(TagState::Existing),
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(CloudError::Api(e)),
    }

    tracing::debug!("POST /tags ({})", name);
    let body = serde_json::json!({ "name": name });
    match api.post("/tags", &body, deadline).await {
        Ok(_) => Ok(TagState::Created),
        Err(e) if e.kind == ApiErrorKind::Client && e.status == Some(422) => {
            tracing::debug!("Tag {} already exists", name);
            Ok(TagState::Existing)
        }
        Err(e) => Err(CloudError::Api(e)),
    }
}
