#[derive(Debug, Serialize)]
struct SelectContactResponse {
    schema_version: String,
    contact: ContactSnapshot,
    signal: SignalState,
}

async fn select_contact(
    Path(key): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SelectContactResponse>, HttpApiError> {
    let key = parse_contact_key(&key)?;

    let (selected, messages) = {
        let mut inner = state.inner.lock().await;
        let selected = inner.portal.select_contact(key);
        let messages = collect_delta_messages(&mut inner);
        let selected = selected.map(|contact| SelectContactResponse {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            contact,
            signal: inner.portal.status().signal,
        });
        (selected, messages)
    };

    // Refusal notices still reach stream subscribers.
    broadcast_messages(&state, messages);

    match selected {
        Ok(response) => Ok(Json(response)),
        Err(refused) => Err(HttpApiError::contact_unavailable(&refused)),
    }
}

#[derive(Debug, Deserialize)]
struct SendMessageRequest {
    text: String,
}

#[derive(Debug, Serialize)]
struct SendMessageResponse {
    schema_version: String,
    contact: ContactKey,
    reply_text: String,
    signal: SignalState,
    transcript_lines: usize,
}

async fn post_message(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, HttpApiError> {
    let (result, messages) = {
        // The state lock is held across the gateway call: one outstanding
        // remote request at a time.
        let mut inner = state.inner.lock().await;
        let result = inner.portal.send_message(&request.text).await;
        let messages = collect_delta_messages(&mut inner);
        let result = result.map(|outcome| SendMessageResponse {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            contact: outcome.contact,
            reply_text: outcome.text,
            signal: inner.portal.status().signal,
            transcript_lines: inner.portal.status().transcript_lines,
        });
        (result, messages)
    };

    broadcast_messages(&state, messages);

    result.map(Json).map_err(HttpApiError::from_portal)
}

#[derive(Debug, Serialize)]
struct PromotionView {
    rank_index: usize,
    rank_name: String,
}

#[derive(Debug, Serialize)]
struct FileChargesResponse {
    schema_version: String,
    verdict_text: String,
    decision: Decision,
    promotion: Option<PromotionView>,
    record: ProgressionRecord,
    rank_name: String,
}

async fn file_charges(
    State(state): State<AppState>,
    Json(request): Json<ChargeSubmission>,
) -> Result<Json<FileChargesResponse>, HttpApiError> {
    if request.charge_target.trim().is_empty() {
        return Err(HttpApiError::invalid_request("chargeTarget is empty", None));
    }
    if request.charge_type.trim().is_empty() {
        return Err(HttpApiError::invalid_request("chargeType is empty", None));
    }

    let (result, messages) = {
        let mut inner = state.inner.lock().await;
        let result = inner.portal.file_charges(&request).await;
        let messages = collect_delta_messages(&mut inner);
        let result = result.map(|outcome| FileChargesResponse {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            verdict_text: outcome.verdict_text,
            decision: outcome.decision,
            promotion: outcome.promotion.map(|promotion| PromotionView {
                rank_index: promotion.rank_index,
                rank_name: promotion.rank_name.to_string(),
            }),
            rank_name: outcome.record.rank_name().to_string(),
            record: outcome.record,
        });
        (result, messages)
    };

    broadcast_messages(&state, messages);

    result.map(Json).map_err(HttpApiError::from_portal)
}

#[derive(Debug, Serialize)]
struct ResetCaseResponse {
    schema_version: String,
    status: CaseStatus,
}

async fn reset_case(
    State(state): State<AppState>,
) -> Result<Json<ResetCaseResponse>, HttpApiError> {
    let (response, messages) = {
        let mut inner = state.inner.lock().await;
        inner.portal.reset_case();
        let messages = collect_delta_messages(&mut inner);
        (
            ResetCaseResponse {
                schema_version: SCHEMA_VERSION_V1.to_string(),
                status: inner.portal.status(),
            },
            messages,
        )
    };

    broadcast_messages(&state, messages);

    Ok(Json(response))
}
