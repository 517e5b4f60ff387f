#[derive(Debug, Serialize)]
struct SessionViewResponse {
    schema_version: String,
    case_id: String,
    active_contact: Option<ContactKey>,
    signal: SignalState,
    contacts: Vec<ContactSnapshot>,
    transcript: Vec<TranscriptLine>,
}

async fn get_session(State(state): State<AppState>) -> Json<SessionViewResponse> {
    let inner = state.inner.lock().await;
    let session = inner.portal.session();

    Json(SessionViewResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        case_id: session.config().case_id.clone(),
        active_contact: session.active_contact(),
        signal: session.signal(),
        contacts: session.contact_snapshots(),
        transcript: session.transcript_lines().to_vec(),
    })
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    schema_version: String,
    status: CaseStatus,
    last_persistence_error: Option<String>,
}

async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let inner = state.inner.lock().await;

    Json(StatusResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        status: inner.portal.status(),
        last_persistence_error: inner
            .portal
            .last_persistence_error()
            .map(|error| error.to_string()),
    })
}

#[derive(Debug, Serialize)]
struct ProgressionResponse {
    schema_version: String,
    record: ProgressionRecord,
    rank_name: String,
}

async fn get_progression(State(state): State<AppState>) -> Json<ProgressionResponse> {
    let inner = state.inner.lock().await;
    let record = inner.portal.progression().clone();

    Json(ProgressionResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        rank_name: record.rank_name().to_string(),
        record,
    })
}

async fn get_case_file() -> Json<CaseFile> {
    Json(CaseFile::default())
}

#[derive(Debug, Serialize)]
struct CaseTabResponse {
    schema_version: String,
    tab: CaseTab,
    body: String,
}

async fn get_case_tab(Path(tab): Path<String>) -> Result<Json<CaseTabResponse>, HttpApiError> {
    let Some(tab) = CaseTab::parse(&tab) else {
        return Err(HttpApiError::invalid_request(
            "unknown case tab",
            Some(format!("tab={tab}")),
        ));
    };

    let case = CaseFile::default();
    Ok(Json(CaseTabResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        tab,
        body: case.tab(tab).to_string(),
    }))
}
