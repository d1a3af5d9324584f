//! # Dispatch Service
//!
//! The one facade a view layer talks to. Each method is a complete picking
//! workflow: validate input, consult the collaborators, drive the store,
//! shape the response.
//!
//! ## Workflow Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  list_dispatches ─► ErpGateway.fetch_headers ─► page slice in memory    │
//! │                                                                         │
//! │  order_header ──► find_header ─► ensure assignment row                  │
//! │                                  └─► backfill registrant (opportunist)  │
//! │                                                                         │
//! │  materialize_detail ─► archived? ─► HistoryRepository                   │
//! │                        snapshot exists? ─► DetailRepository             │
//! │                        else ─► ErpGateway.fetch_detail ─► snapshot      │
//! │                                                                         │
//! │  apply_scan / reset_scan ─► gates (started, not finalized)              │
//! │                             └─► DetailRepository (guarded UPDATE)       │
//! │                                                                         │
//! │  mark_start / mark_finish ─► AssignmentRepository (one tx each)         │
//! │                                                                         │
//! │  complete_order ─► finalized? ─► DetailRepository.clear_for_order       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Methods take [`OrderKey`] and return DTOs; domain types never cross the
//! boundary raw except [`DispatchHeader`] from [`DispatchService::find_header`]
//! and [`UserRecord`] from [`DispatchService::list_users`], which already have
//! view shape.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use despacho_core::period::{default_window, Period};
use despacho_core::scan::parse_scan_payload;
use despacho_core::validation::{
    validate_order_key, validate_paging, validate_product_code, validate_scan_quantity,
    validate_user_code,
};
use despacho_core::{
    DetailSource, DispatchHeader, OrderKey, PickingLine, ScanOutcome, UserRecord, ValidationError,
    HEADER_LOOKUP_WINDOW,
};
use despacho_db::{Database, DbError};

use crate::dto::{
    AssignResponse, AssignmentView, CompleteResponse, CompleteStatus, DetailResponse,
    DispatchHeaderView, DispatchPage, FinishResponse, OrderHeaderResponse, PickingLineView,
    ScanResponse, ScanStatus, StartResponse,
};
use crate::error::EngineResult;
use crate::gateway::{ErpGateway, UserDirectory};

// =============================================================================
// Dispatch Service
// =============================================================================

/// Orchestrates the picking workflows over the store and the collaborators.
///
/// Cheap to clone pieces: the database handle shares its pool and the
/// collaborators are behind [`Arc`], so one service can serve every station.
pub struct DispatchService {
    /// The local picking store.
    db: Database,
    /// ERP stored procedures (headers, detail).
    erp: Arc<dyn ErpGateway>,
    /// User code to display-name resolution.
    users: Arc<dyn UserDirectory>,
}

impl DispatchService {
    pub fn new(db: Database, erp: Arc<dyn ErpGateway>, users: Arc<dyn UserDirectory>) -> Self {
        DispatchService { db, erp, users }
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// Lists pending dispatch orders, one page at a time.
    ///
    /// ## Arguments
    /// * `date_from` / `date_to` - Optional `YYYY-MM-DD` filters, reduced to
    ///   their year-month periods. Malformed dates are a hard error, not an
    ///   empty filter.
    /// * `page` / `page_size` - 1-based page over the full result set
    ///
    /// When neither date is given the trailing default window applies. The
    /// listing procedure has no paging of its own; the full result set is
    /// fetched and sliced here.
    pub async fn list_dispatches(
        &self,
        company: &str,
        branch: &str,
        date_from: Option<&str>,
        date_to: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> EngineResult<DispatchPage> {
        validate_paging(page, page_size)?;

        let from = match date_from {
            Some(input) => Period::parse_ymd(input)?,
            None => None,
        };
        let to = match date_to {
            Some(input) => Period::parse_ymd(input)?,
            None => None,
        };

        // No filter at all falls back to the trailing default window. One
        // given side passes through with the other side unbounded.
        let (from, to) = match (from, to) {
            (None, None) => {
                let (start, end) = default_window(Utc::now().date_naive());
                (Some(start), Some(end))
            }
            bounds => bounds,
        };

        debug!(company, branch, ?from, ?to, page, page_size, "Listing dispatches");

        let headers = self.erp.fetch_headers(company, branch, from, to).await?;
        let total = headers.len();

        let offset = (page as usize - 1) * page_size as usize;
        let items: Vec<DispatchHeaderView> = headers
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .map(DispatchHeaderView::from)
            .collect();

        debug!(total, returned = items.len(), "Dispatch listing served");

        Ok(DispatchPage {
            items,
            total,
            page,
            page_size,
        })
    }

    /// Looks one order up in the default listing window.
    ///
    /// The listing procedure is the only header source there is, so lookup
    /// scans its result set linearly, padded numbers and all. Orders older
    /// than the window (or beyond [`HEADER_LOOKUP_WINDOW`] rows) come back
    /// as `None`.
    pub async fn find_header(&self, key: &OrderKey) -> EngineResult<Option<DispatchHeader>> {
        validate_order_key(key)?;

        let (from, to) = default_window(Utc::now().date_naive());
        let headers = self
            .erp
            .fetch_headers(&key.company, &key.branch, Some(from), Some(to))
            .await?;

        Ok(headers
            .into_iter()
            .take(HEADER_LOOKUP_WINDOW as usize)
            .find(|header| header.matches(&key.order_no, &key.sub_order_no)))
    }

    // =========================================================================
    // Order Header
    // =========================================================================

    /// Loads the detail screen's header block for one order.
    ///
    /// Ensures the order's assignment row exists, then merges the dispatch
    /// header with whatever assignment state is on record.
    ///
    /// ## Arguments
    /// * `registrant_hint` - The signed-in user opening the screen. Recorded
    ///   as registrant only when none is set yet; an existing registrant
    ///   always wins. A hint the directory does not know is ignored, never
    ///   an error: the screen still has to open.
    ///
    /// ## Returns
    /// `None` when the order is not in the listing window.
    pub async fn order_header(
        &self,
        key: &OrderKey,
        registrant_hint: Option<&str>,
    ) -> EngineResult<Option<OrderHeaderResponse>> {
        validate_order_key(key)?;
        debug!(%key, "Loading order header");

        let Some(header) = self.find_header(key).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        let assignments = self.db.assignments();
        assignments.ensure_row(key, now).await?;

        if let Some(hint) = registrant_hint {
            match validate_user_code(hint) {
                Ok(code) => match self.users.resolve_name(&key.company, &code).await? {
                    Some(name) => {
                        if assignments
                            .fill_registrant_if_absent(key, &code, &name, now)
                            .await?
                        {
                            info!(%key, %code, "Registrant recorded");
                        }
                    }
                    None => debug!(%key, %code, "Registrant hint not in directory, ignored"),
                },
                Err(_) => debug!(%key, "Blank registrant hint ignored"),
            }
        }

        let assignment = assignments
            .get(key)
            .await?
            .ok_or_else(|| DbError::not_found("picking_assignment", key.to_string()))?;

        Ok(Some(OrderHeaderResponse::merge(header, assignment)))
    }

    // =========================================================================
    // Worklist
    // =========================================================================

    /// Opens an order's worklist, materializing it on first touch.
    ///
    /// ## Rules
    /// - Finalized orders read from the archive, never the ERP
    /// - An existing snapshot is served as-is; the ERP is not asked again
    /// - First touch fetches the detail procedure and snapshots it
    /// - An empty ERP result is served empty but NOT snapshotted, so the
    ///   next open asks again instead of pinning an empty worklist
    pub async fn materialize_detail(&self, key: &OrderKey) -> EngineResult<DetailResponse> {
        validate_order_key(key)?;

        if self.db.assignments().is_finalized(key).await? {
            return self.archive_detail(key).await;
        }

        let detail = self.db.detail();
        if !detail.exists_for_order(key).await? {
            let lines = self.erp.fetch_detail(key).await?;
            if lines.is_empty() {
                debug!(%key, "ERP returned no detail lines");
                return Ok(DetailResponse::from_lines(DetailSource::Active, Vec::new()));
            }

            let inserted = detail.insert_snapshot(key, &lines).await?;
            info!(%key, inserted, "Worklist materialized");
        }

        let lines = detail.list_for_order(key).await?;
        Ok(DetailResponse::from_lines(DetailSource::Active, lines))
    }

    /// Reads an order's worklist without materializing anything.
    ///
    /// Finalized orders are served from the archive through the same shape.
    pub async fn read_detail(&self, key: &OrderKey) -> EngineResult<DetailResponse> {
        validate_order_key(key)?;

        if self.db.assignments().is_finalized(key).await? {
            return self.archive_detail(key).await;
        }

        let lines = self.db.detail().list_for_order(key).await?;
        Ok(DetailResponse::from_lines(DetailSource::Active, lines))
    }

    async fn archive_detail(&self, key: &OrderKey) -> EngineResult<DetailResponse> {
        let lines: Vec<PickingLine> = self
            .db
            .history()
            .list_for_order(key)
            .await?
            .into_iter()
            .map(PickingLine::from)
            .collect();

        Ok(DetailResponse::from_lines(DetailSource::Archive, lines))
    }

    // =========================================================================
    // Scanning
    // =========================================================================

    /// Applies one scan event to a worklist line.
    ///
    /// ## Rules
    /// - The order must have started and must not be finalized
    /// - The delta must be a positive finite quantity (hard error otherwise)
    /// - Accumulation past the supplied quantity is rejected atomically;
    ///   landing exactly on it is the goal, not an error
    ///
    /// On success the response carries the refreshed worklist and whether
    /// the whole order is now reconciled; rejections carry nothing.
    pub async fn apply_scan(
        &self,
        key: &OrderKey,
        product_code: &str,
        quantity: f64,
    ) -> EngineResult<ScanResponse> {
        validate_order_key(key)?;
        let product = validate_product_code(product_code)?;
        validate_scan_quantity(quantity)?;

        if let Some(rejection) = self.scan_gate(key).await? {
            return Ok(ScanResponse::rejected(rejection));
        }

        match self.db.detail().apply_scan(key, &product, quantity).await? {
            ScanOutcome::Applied { completed } => {
                let lines = self.db.detail().list_for_order(key).await?;
                Ok(ScanResponse {
                    status: ScanStatus::Applied,
                    completed,
                    lines: lines.into_iter().map(PickingLineView::from).collect(),
                })
            }
            rejected => Ok(ScanResponse::rejected(rejected.into())),
        }
    }

    /// Applies a scan from a raw QR label payload.
    ///
    /// Parses the label (a hard error when malformed), checks its printed
    /// order number against this order, then follows [`Self::apply_scan`].
    pub async fn apply_scan_payload(&self, key: &OrderKey, raw: &str) -> EngineResult<ScanResponse> {
        let payload = parse_scan_payload(raw)?;

        if !payload.matches_order(&key.order_no) {
            debug!(%key, label = %payload.label, "Label printed for a different order");
            return Ok(ScanResponse::rejected(ScanStatus::WrongOrder));
        }

        self.apply_scan(key, &payload.product_code, payload.quantity)
            .await
    }

    /// Zeroes one line's scanned quantity so it can be recounted.
    ///
    /// Same gates as scanning: resets are part of the counting workflow and
    /// a finalized worklist is immutable.
    pub async fn reset_scan(&self, key: &OrderKey, product_code: &str) -> EngineResult<ScanResponse> {
        validate_order_key(key)?;
        let product = validate_product_code(product_code)?;

        if let Some(rejection) = self.scan_gate(key).await? {
            return Ok(ScanResponse::rejected(rejection));
        }

        if !self.db.detail().reset_scan(key, &product).await? {
            return Ok(ScanResponse::rejected(ScanStatus::NotFound));
        }

        let lines = self.db.detail().list_for_order(key).await?;
        let completed = !lines.is_empty() && lines.iter().all(|line| !line.is_pending());
        Ok(ScanResponse {
            status: ScanStatus::Applied,
            completed,
            lines: lines.into_iter().map(PickingLineView::from).collect(),
        })
    }

    /// The state gates every scan-path mutation passes first.
    ///
    /// ## Returns
    /// `Some(rejection)` when the order cannot take scans right now, `None`
    /// when it can. Finalized wins over not-started: a finalized order also
    /// has a start timestamp, and "finalized" is the answer that matters.
    async fn scan_gate(&self, key: &OrderKey) -> EngineResult<Option<ScanStatus>> {
        match self.db.assignments().get(key).await? {
            None => Ok(Some(ScanStatus::NotStarted)),
            Some(assignment) if assignment.is_finalized() => Ok(Some(ScanStatus::Finalized)),
            Some(assignment) if !assignment.has_started() => Ok(Some(ScanStatus::NotStarted)),
            Some(_) => Ok(None),
        }
    }

    // =========================================================================
    // People
    // =========================================================================

    /// Assigns the registrant and/or preparer of an order.
    ///
    /// ## Rules
    /// - At least one code must be given (hard error otherwise)
    /// - Every given code must resolve in the directory; one unknown code
    ///   rejects the whole request and nothing is stored
    /// - A given side overwrites, an omitted side keeps its current value
    pub async fn assign_users(
        &self,
        key: &OrderKey,
        registrant_code: Option<&str>,
        preparer_code: Option<&str>,
    ) -> EngineResult<AssignResponse> {
        validate_order_key(key)?;

        if registrant_code.is_none() && preparer_code.is_none() {
            return Err(ValidationError::Required {
                field: "registrant_code or preparer_code".to_string(),
            }
            .into());
        }

        let mut registrant: Option<(String, String)> = None;
        if let Some(code) = registrant_code {
            let code = validate_user_code(code)?;
            match self.users.resolve_name(&key.company, &code).await? {
                Some(name) => registrant = Some((code, name)),
                None => return Ok(AssignResponse::unknown_user(code)),
            }
        }

        let mut preparer: Option<(String, String)> = None;
        if let Some(code) = preparer_code {
            let code = validate_user_code(code)?;
            match self.users.resolve_name(&key.company, &code).await? {
                Some(name) => preparer = Some((code, name)),
                None => return Ok(AssignResponse::unknown_user(code)),
            }
        }

        let assignment = self
            .db
            .assignments()
            .assign(
                key,
                registrant.as_ref().map(|(code, name)| (code.as_str(), name.as_str())),
                preparer.as_ref().map(|(code, name)| (code.as_str(), name.as_str())),
                Utc::now(),
            )
            .await?;

        Ok(AssignResponse::applied(AssignmentView::from(assignment)))
    }

    /// Returns the assignment record of an order, if one exists yet.
    pub async fn assignment(&self, key: &OrderKey) -> EngineResult<Option<AssignmentView>> {
        validate_order_key(key)?;

        Ok(self
            .db
            .assignments()
            .get(key)
            .await?
            .map(AssignmentView::from))
    }

    /// Lists the warehouse users of a company, for the people pickers.
    pub async fn list_users(&self, company: &str) -> EngineResult<Vec<UserRecord>> {
        Ok(self.users.list_users(company).await?)
    }

    // =========================================================================
    // Timing
    // =========================================================================

    /// Records the start of an order's physical preparation.
    ///
    /// Requires a preparer on record. Re-starting an unfinished order
    /// re-opens its timing window; a finalized order rejects the request.
    pub async fn mark_start(&self, key: &OrderKey) -> EngineResult<StartResponse> {
        validate_order_key(key)?;
        debug!(%key, "Start requested");

        let outcome = self.db.assignments().start(key, Utc::now()).await?;
        Ok(StartResponse::from(outcome))
    }

    /// Records the end of an order's preparation and its duration.
    ///
    /// Rejected while any line still has `scanned != supplied`, when the
    /// order never started, or when it is already finalized. The pending
    /// check and the finish write share one transaction.
    pub async fn mark_finish(&self, key: &OrderKey) -> EngineResult<FinishResponse> {
        validate_order_key(key)?;
        debug!(%key, "Finish requested");

        let outcome = self.db.assignments().finish(key, Utc::now()).await?;
        Ok(FinishResponse::from(outcome))
    }

    // =========================================================================
    // Completion
    // =========================================================================

    /// Clears a finalized order's active worklist.
    ///
    /// From then on reads serve the archive. Refused for orders that are
    /// not finalized; this is the only bulk delete in the system and the
    /// end timestamp is its authorization.
    pub async fn complete_order(&self, key: &OrderKey) -> EngineResult<CompleteResponse> {
        validate_order_key(key)?;

        if !self.db.assignments().is_finalized(key).await? {
            return Ok(CompleteResponse {
                status: CompleteStatus::NotFinalized,
                lines_cleared: None,
            });
        }

        let cleared = self.db.detail().clear_for_order(key).await?;
        info!(%key, cleared, "Worklist cleared");

        Ok(CompleteResponse {
            status: CompleteStatus::Cleared,
            lines_cleared: Some(cleared),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use despacho_core::{ErpDetailLine, DEFAULT_BRANCH, DEFAULT_COMPANY};
    use despacho_db::DbConfig;

    use crate::dto::{AssignStatus, FinishStatus, StartStatus};
    use crate::gateway::GatewayError;

    // =========================================================================
    // Collaborator Stubs
    // =========================================================================

    struct StubErp {
        headers: Vec<DispatchHeader>,
        detail: Vec<ErpDetailLine>,
        detail_calls: AtomicUsize,
    }

    #[async_trait]
    impl ErpGateway for StubErp {
        async fn fetch_headers(
            &self,
            _company: &str,
            _branch: &str,
            _from: Option<Period>,
            _to: Option<Period>,
        ) -> Result<Vec<DispatchHeader>, GatewayError> {
            Ok(self.headers.clone())
        }

        async fn fetch_detail(&self, _key: &OrderKey) -> Result<Vec<ErpDetailLine>, GatewayError> {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.detail.clone())
        }
    }

    struct StubDirectory {
        users: Vec<UserRecord>,
    }

    #[async_trait]
    impl UserDirectory for StubDirectory {
        async fn resolve_name(
            &self,
            _company: &str,
            code: &str,
        ) -> Result<Option<String>, GatewayError> {
            Ok(self
                .users
                .iter()
                .find(|user| user.code == code.trim())
                .map(|user| user.name.clone()))
        }

        async fn list_users(&self, _company: &str) -> Result<Vec<UserRecord>, GatewayError> {
            Ok(self.users.clone())
        }
    }

    // =========================================================================
    // Fixtures
    // =========================================================================

    fn key() -> OrderKey {
        OrderKey::new(DEFAULT_COMPANY, DEFAULT_BRANCH, "0001234", "0000010")
    }

    fn header(order_no: &str, sub_order_no: &str, customer: &str) -> DispatchHeader {
        DispatchHeader {
            order_no: order_no.to_string(),
            sub_order_no: sub_order_no.to_string(),
            doc_date: "2026-08-01".to_string(),
            customer: customer.to_string(),
            address: Some("Av. Argentina 2430".to_string()),
            observation: None,
            status_text: Some("POR DESPACHAR".to_string()),
            commercial_ref: Some("OC-7741".to_string()),
        }
    }

    fn erp_line(product: &str, seq: i64, supplied: f64) -> ErpDetailLine {
        ErpDetailLine {
            item_seq: seq,
            description: format!("Product {product}"),
            unit: "UND".to_string(),
            unit_factor: Some(1.0),
            closure_flag: None,
            product_code: product.to_string(),
            qty_ordered: Some(supplied),
            qty_supplied: Some(supplied),
            cartons: Some(1.0),
            net_weight: Some(2.5),
            qty_scanned: None,
            location: Some("A-01".to_string()),
        }
    }

    fn directory_users() -> Vec<UserRecord> {
        vec![
            UserRecord {
                code: "R01".to_string(),
                name: "Rosa Quispe".to_string(),
            },
            UserRecord {
                code: "P01".to_string(),
                name: "Pedro Huaman".to_string(),
            },
        ]
    }

    async fn service_with(
        headers: Vec<DispatchHeader>,
        detail: Vec<ErpDetailLine>,
    ) -> (DispatchService, Arc<StubErp>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let erp = Arc::new(StubErp {
            headers,
            detail,
            detail_calls: AtomicUsize::new(0),
        });
        let directory = Arc::new(StubDirectory {
            users: directory_users(),
        });
        let service = DispatchService::new(db, erp.clone(), directory);
        (service, erp)
    }

    /// One listed order with a two-line detail.
    async fn picking_service() -> (DispatchService, Arc<StubErp>) {
        service_with(
            vec![header("0001234", "0000010", "Comercial Aurora SAC")],
            vec![erp_line("10500123", 1, 10.0), erp_line("10500456", 2, 4.0)],
        )
        .await
    }

    /// Brings the order to the scanning state: materialized, preparer
    /// assigned, started.
    async fn started_service() -> (DispatchService, Arc<StubErp>) {
        let (service, erp) = picking_service().await;
        service.materialize_detail(&key()).await.unwrap();
        service
            .assign_users(&key(), None, Some("P01"))
            .await
            .unwrap();
        service.mark_start(&key()).await.unwrap();
        (service, erp)
    }

    fn line_scanned(response: &ScanResponse, product: &str) -> f64 {
        response
            .lines
            .iter()
            .find(|line| line.product_code == product)
            .unwrap()
            .qty_scanned
    }

    // =========================================================================
    // Listing
    // =========================================================================

    #[tokio::test]
    async fn test_list_dispatches_pages_in_memory() {
        let headers = (0..5)
            .map(|i| header(&format!("000123{i}"), "0000010", "ACME"))
            .collect();
        let (service, _erp) = service_with(headers, vec![]).await;

        let page = service
            .list_dispatches("01", "01", None, None, 2, 2)
            .await
            .unwrap();

        assert_eq!(page.total, 5);
        assert_eq!(page.page, 2);
        assert_eq!(page.page_size, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].order_no, "0001232");
        assert_eq!(page.items[1].order_no, "0001233");

        // A page past the end is empty, with the total still reported.
        let beyond = service
            .list_dispatches("01", "01", None, None, 4, 2)
            .await
            .unwrap();
        assert_eq!(beyond.total, 5);
        assert!(beyond.items.is_empty());
    }

    #[tokio::test]
    async fn test_list_dispatches_rejects_bad_input() {
        let (service, _erp) = service_with(vec![], vec![]).await;

        assert!(service
            .list_dispatches("01", "01", Some("23/08/2026"), None, 1, 20)
            .await
            .is_err());

        assert!(service
            .list_dispatches("01", "01", None, None, 0, 20)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_list_dispatches_empty_erp() {
        let (service, _erp) = service_with(vec![], vec![]).await;

        let page = service
            .list_dispatches("01", "01", None, None, 1, 20)
            .await
            .unwrap();

        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_find_header_ignores_padding() {
        let (service, _erp) = service_with(
            vec![header("0001234   ", "  0000010", "Comercial Aurora SAC")],
            vec![],
        )
        .await;

        let found = service.find_header(&key()).await.unwrap().unwrap();
        assert_eq!(found.customer, "Comercial Aurora SAC");

        let missing = OrderKey::new("01", "01", "0009999", "0000010");
        assert!(service.find_header(&missing).await.unwrap().is_none());
    }

    // =========================================================================
    // Order Header
    // =========================================================================

    #[tokio::test]
    async fn test_order_header_merges_and_backfills_registrant() {
        let (service, _erp) = picking_service().await;

        let response = service
            .order_header(&key(), Some("R01"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.customer, "Comercial Aurora SAC");
        assert_eq!(response.commercial_ref.as_deref(), Some("OC-7741"));
        assert_eq!(response.registrant_code.as_deref(), Some("R01"));
        assert_eq!(response.registrant_name.as_deref(), Some("Rosa Quispe"));
        assert_eq!(response.preparer_code, None);
        assert_eq!(response.started_at, None);

        // A later opener does not displace the recorded registrant.
        let second = service
            .order_header(&key(), Some("P01"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.registrant_code.as_deref(), Some("R01"));
    }

    #[tokio::test]
    async fn test_order_header_ignores_unknown_hint() {
        let (service, _erp) = picking_service().await;

        let response = service
            .order_header(&key(), Some("Z99"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.registrant_code, None);
        assert_eq!(response.registrant_name, None);
    }

    #[tokio::test]
    async fn test_order_header_unknown_order() {
        let (service, _erp) = picking_service().await;

        let missing = OrderKey::new("01", "01", "0009999", "0000010");
        assert!(service
            .order_header(&missing, Some("R01"))
            .await
            .unwrap()
            .is_none());
    }

    // =========================================================================
    // Worklist
    // =========================================================================

    #[tokio::test]
    async fn test_materialize_detail_fetches_erp_once() {
        let (service, erp) = picking_service().await;

        let first = service.materialize_detail(&key()).await.unwrap();
        assert_eq!(first.source, DetailSource::Active);
        assert_eq!(first.lines.len(), 2);
        assert!(!first.completed);

        let second = service.materialize_detail(&key()).await.unwrap();
        assert_eq!(second.lines.len(), 2);

        assert_eq!(erp.detail_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_materialize_detail_empty_erp_is_not_pinned() {
        let (service, erp) = service_with(
            vec![header("0001234", "0000010", "ACME")],
            vec![],
        )
        .await;

        let first = service.materialize_detail(&key()).await.unwrap();
        assert!(first.lines.is_empty());
        assert!(!first.completed);

        // Nothing was snapshotted, so the next open asks the ERP again.
        service.materialize_detail(&key()).await.unwrap();
        assert_eq!(erp.detail_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_read_detail_does_not_materialize() {
        let (service, erp) = picking_service().await;

        let response = service.read_detail(&key()).await.unwrap();
        assert!(response.lines.is_empty());
        assert_eq!(erp.detail_calls.load(Ordering::SeqCst), 0);
    }

    // =========================================================================
    // Scanning
    // =========================================================================

    #[tokio::test]
    async fn test_scan_requires_start() {
        let (service, _erp) = picking_service().await;
        service.materialize_detail(&key()).await.unwrap();

        // No assignment row at all.
        let response = service.apply_scan(&key(), "10500123", 1.0).await.unwrap();
        assert_eq!(response.status, ScanStatus::NotStarted);
        assert!(response.lines.is_empty());

        // Row exists, preparer assigned, still not started.
        service
            .assign_users(&key(), None, Some("P01"))
            .await
            .unwrap();
        let response = service.apply_scan(&key(), "10500123", 1.0).await.unwrap();
        assert_eq!(response.status, ScanStatus::NotStarted);
    }

    #[tokio::test]
    async fn test_scan_accumulates_and_completes() {
        let (service, _erp) = started_service().await;

        let partial = service.apply_scan(&key(), "10500123", 6.0).await.unwrap();
        assert_eq!(partial.status, ScanStatus::Applied);
        assert!(!partial.completed);
        assert_eq!(line_scanned(&partial, "10500123"), 6.0);

        let first_done = service.apply_scan(&key(), "10500123", 4.0).await.unwrap();
        assert_eq!(first_done.status, ScanStatus::Applied);
        assert!(!first_done.completed);

        let all_done = service.apply_scan(&key(), "10500456", 4.0).await.unwrap();
        assert!(all_done.completed);
        assert!(all_done.lines.iter().all(|line| line.status_flag == "1"));
    }

    #[tokio::test]
    async fn test_scan_rejections() {
        let (service, _erp) = started_service().await;

        let over = service.apply_scan(&key(), "10500123", 11.0).await.unwrap();
        assert_eq!(over.status, ScanStatus::Overpicking);
        assert!(over.lines.is_empty());

        let unknown = service.apply_scan(&key(), "99999999", 1.0).await.unwrap();
        assert_eq!(unknown.status, ScanStatus::NotFound);

        // The rejected deltas left nothing behind.
        let detail = service.read_detail(&key()).await.unwrap();
        assert!(detail.lines.iter().all(|line| line.qty_scanned == 0.0));
    }

    #[tokio::test]
    async fn test_scan_rejects_nonpositive_quantity() {
        let (service, _erp) = started_service().await;

        assert!(service.apply_scan(&key(), "10500123", 0.0).await.is_err());
        assert!(service.apply_scan(&key(), "10500123", -1.0).await.is_err());
    }

    #[tokio::test]
    async fn test_scan_payload_path() {
        let (service, _erp) = started_service().await;

        let raw = "PPC|0001234|20260810|105.00123|2|PE|L01|ET00871|F";
        let applied = service.apply_scan_payload(&key(), raw).await.unwrap();
        assert_eq!(applied.status, ScanStatus::Applied);
        assert_eq!(line_scanned(&applied, "10500123"), 2.0);

        let foreign = "PPC|0009999|20260810|105.00123|2|PE|L01|ET00872|F";
        let rejected = service.apply_scan_payload(&key(), foreign).await.unwrap();
        assert_eq!(rejected.status, ScanStatus::WrongOrder);

        assert!(service.apply_scan_payload(&key(), "not a label").await.is_err());
    }

    #[tokio::test]
    async fn test_reset_reopens_line() {
        let (service, _erp) = started_service().await;

        service.apply_scan(&key(), "10500123", 10.0).await.unwrap();

        let reset = service.reset_scan(&key(), "10500123").await.unwrap();
        assert_eq!(reset.status, ScanStatus::Applied);
        assert!(!reset.completed);
        assert_eq!(line_scanned(&reset, "10500123"), 0.0);

        let unknown = service.reset_scan(&key(), "99999999").await.unwrap();
        assert_eq!(unknown.status, ScanStatus::NotFound);
    }

    #[tokio::test]
    async fn test_scan_after_finalize_rejected() {
        let (service, _erp) = started_service().await;

        service.apply_scan(&key(), "10500123", 10.0).await.unwrap();
        service.apply_scan(&key(), "10500456", 4.0).await.unwrap();
        let finish = service.mark_finish(&key()).await.unwrap();
        assert_eq!(finish.status, FinishStatus::Finished);

        let scan = service.apply_scan(&key(), "10500123", 1.0).await.unwrap();
        assert_eq!(scan.status, ScanStatus::Finalized);

        let reset = service.reset_scan(&key(), "10500123").await.unwrap();
        assert_eq!(reset.status, ScanStatus::Finalized);
    }

    // =========================================================================
    // People
    // =========================================================================

    #[tokio::test]
    async fn test_assign_users_coalesces_sides() {
        let (service, _erp) = picking_service().await;

        let first = service
            .assign_users(&key(), Some("R01"), None)
            .await
            .unwrap();
        assert_eq!(first.status, AssignStatus::Applied);
        let view = first.assignment.unwrap();
        assert_eq!(view.registrant_code.as_deref(), Some("R01"));
        assert_eq!(view.preparer_code, None);

        let second = service
            .assign_users(&key(), None, Some("P01"))
            .await
            .unwrap();
        let view = second.assignment.unwrap();
        assert_eq!(view.registrant_code.as_deref(), Some("R01"));
        assert_eq!(view.preparer_code.as_deref(), Some("P01"));
        assert_eq!(view.preparer_name.as_deref(), Some("Pedro Huaman"));

        assert!(service.assign_users(&key(), None, None).await.is_err());
    }

    #[tokio::test]
    async fn test_assign_users_unknown_code_rejected() {
        let (service, _erp) = picking_service().await;

        let response = service
            .assign_users(&key(), Some("R01"), Some("Z99"))
            .await
            .unwrap();

        assert_eq!(response.status, AssignStatus::UnknownUser);
        assert_eq!(response.unknown_code.as_deref(), Some("Z99"));
        assert!(response.assignment.is_none());

        // The known half was not stored either.
        assert!(service.assignment(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_users_passthrough() {
        let (service, _erp) = picking_service().await;

        let users = service.list_users("01").await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].code, "R01");
    }

    // =========================================================================
    // Timing
    // =========================================================================

    #[tokio::test]
    async fn test_start_requires_preparer() {
        let (service, _erp) = picking_service().await;

        let refused = service.mark_start(&key()).await.unwrap();
        assert_eq!(refused.status, StartStatus::MissingPreparer);
        assert_eq!(refused.started_at, None);

        service
            .assign_users(&key(), None, Some("P01"))
            .await
            .unwrap();

        let started = service.mark_start(&key()).await.unwrap();
        assert_eq!(started.status, StartStatus::Started);
        assert!(started.started_at.is_some());
    }

    #[tokio::test]
    async fn test_finish_before_start() {
        let (service, _erp) = picking_service().await;

        let response = service.mark_finish(&key()).await.unwrap();
        assert_eq!(response.status, FinishStatus::NotStarted);
    }

    #[tokio::test]
    async fn test_finish_blocks_on_pending_lines() {
        let (service, _erp) = started_service().await;

        service.apply_scan(&key(), "10500123", 10.0).await.unwrap();

        let blocked = service.mark_finish(&key()).await.unwrap();
        assert_eq!(blocked.status, FinishStatus::PendingItems);
        assert_eq!(blocked.pending, Some(1));
        assert_eq!(blocked.finished_at, None);

        service.apply_scan(&key(), "10500456", 4.0).await.unwrap();

        let finished = service.mark_finish(&key()).await.unwrap();
        assert_eq!(finished.status, FinishStatus::Finished);
        assert!(finished.finished_at.is_some());
        assert!(finished.duration_min.unwrap() >= 0.0);
    }

    // =========================================================================
    // Completion
    // =========================================================================

    #[tokio::test]
    async fn test_complete_requires_finalized() {
        let (service, _erp) = started_service().await;

        let refused = service.complete_order(&key()).await.unwrap();
        assert_eq!(refused.status, CompleteStatus::NotFinalized);
        assert_eq!(refused.lines_cleared, None);

        service.apply_scan(&key(), "10500123", 10.0).await.unwrap();
        service.apply_scan(&key(), "10500456", 4.0).await.unwrap();
        service.mark_finish(&key()).await.unwrap();

        let cleared = service.complete_order(&key()).await.unwrap();
        assert_eq!(cleared.status, CompleteStatus::Cleared);
        assert_eq!(cleared.lines_cleared, Some(2));

        // Reads now come from the archive, which the external transfer job
        // has not populated yet in this test.
        let detail = service.read_detail(&key()).await.unwrap();
        assert_eq!(detail.source, DetailSource::Archive);
        assert!(detail.lines.is_empty());
    }
}
