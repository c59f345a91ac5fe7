use crate::client::{DescriptionService, GenerateError};
use crate::description::{self, DescriptionCard, GeneratedDescription};
use crate::files::FileHandle;
use crate::selection::{PreviewFactory, Selection};
use crate::tone::Tone;

/// Identifies one submission. Completions carrying an outdated ticket are
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Everything needed to send one request, detached from the form so it can
/// move to a background task.
#[derive(Debug)]
pub struct Submission {
    pub ticket: Ticket,
    pub files: Vec<FileHandle>,
    pub tone: Tone,
}

/// The product description form: selected images, tone, loading flag and
/// the last set of results.
///
/// `H` is the preview handle type (see [`PreviewFactory`]).
///
/// Submitting is split in two so the request can run anywhere:
/// [`begin_submit`](Self::begin_submit) flips the loading flag and hands out
/// a [`Submission`], [`complete`](Self::complete) applies its outcome.
/// [`submit`](Self::submit) does both around an awaited service call.
///
/// ```rust,no_run
/// use product_describer::client::DescriptionClient;
/// use product_describer::files::FileHandle;
/// use product_describer::form::DescriptionForm;
/// use product_describer::tone::Tone;
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = DescriptionClient::new("http://localhost:8000", None)?;
/// let mut form: DescriptionForm<()> = DescriptionForm::new(Tone::Luxury);
/// form.add_files([FileHandle::from_path("watch.jpg".as_ref())?], &mut |_: &FileHandle| ());
/// form.submit(&client).await;
/// for card in form.cards() {
///     print!("{}", card.render_text());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DescriptionForm<H> {
    selection: Selection<H>,
    tone: Tone,
    results: Vec<GeneratedDescription>,
    in_flight: Option<Ticket>,
    next_ticket: u64,
    last_error: Option<String>,
}

impl<H> Default for DescriptionForm<H> {
    fn default() -> Self {
        Self::new(Tone::default())
    }
}

impl<H> DescriptionForm<H> {
    pub fn new(tone: Tone) -> Self {
        Self {
            selection: Selection::new(),
            tone,
            results: Vec::new(),
            in_flight: None,
            next_ticket: 0,
            last_error: None,
        }
    }

    // ── Selection ───────────────────────────────────────────────────

    pub fn add_files<I, P>(&mut self, files: I, previews: &mut P)
    where
        I: IntoIterator<Item = FileHandle>,
        P: PreviewFactory<Handle = H>,
    {
        self.selection.add_files(files, previews);
    }

    pub fn remove_file(&mut self, index: usize) -> bool {
        self.selection.remove_file(index)
    }

    pub fn clear_files(&mut self) {
        self.selection.clear();
    }

    pub fn selection(&self) -> &Selection<H> {
        &self.selection
    }

    // ── Tone ────────────────────────────────────────────────────────

    pub fn tone(&self) -> Tone {
        self.tone
    }

    pub fn set_tone(&mut self, tone: Tone) {
        self.tone = tone;
    }

    // ── Submission ──────────────────────────────────────────────────

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        !self.is_loading() && !self.selection.is_empty()
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_loading() {
            "Generating..."
        } else {
            "Generate Descriptions"
        }
    }

    /// Start a submission. Returns `None` (and changes nothing) when the
    /// selection is empty or a request is already in flight.
    pub fn begin_submit(&mut self) -> Option<Submission> {
        if !self.can_submit() {
            return None;
        }
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight = Some(ticket);
        self.last_error = None;

        Some(Submission {
            ticket,
            files: self.selection.snapshot(),
            tone: self.tone,
        })
    }

    /// Apply the outcome of the submission identified by `ticket`.
    ///
    /// Success replaces the results wholesale. Failure is logged, recorded
    /// in [`last_error`](Self::last_error), and leaves the results alone.
    /// The loading flag is cleared either way. Returns `false` if `ticket`
    /// is not the one in flight, in which case nothing changes.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: Result<Vec<GeneratedDescription>, GenerateError>,
    ) -> bool {
        if self.in_flight != Some(ticket) {
            log::debug!("Dropping result of stale submission {ticket:?}");
            return false;
        }
        self.in_flight = None;

        match outcome {
            Ok(results) => {
                log::info!("Showing {} description(s)", results.len());
                self.results = results;
            }
            Err(e) => {
                log::error!("Description generation failed: {e}");
                self.last_error = Some(e.to_string());
            }
        }
        true
    }

    /// Forget the in-flight submission. Its result, if it ever arrives, is
    /// ignored.
    pub fn abandon(&mut self) {
        if let Some(ticket) = self.in_flight.take() {
            log::debug!("Abandoned submission {ticket:?}");
        }
    }

    /// Submit and wait for the result in place. Returns `false` when the
    /// submission was a no-op (nothing selected, or already loading).
    pub async fn submit<S>(&mut self, service: &S) -> bool
    where
        S: DescriptionService + ?Sized,
    {
        let Some(submission) = self.begin_submit() else {
            return false;
        };
        let mut guard = InFlightGuard {
            form: self,
            ticket: submission.ticket,
        };
        let outcome = service.generate(submission.files, submission.tone).await;
        guard.form.complete(guard.ticket, outcome);
        true
    }

    // ── Results ─────────────────────────────────────────────────────

    pub fn results(&self) -> &[GeneratedDescription] {
        &self.results
    }

    pub fn cards(&self) -> impl Iterator<Item = DescriptionCard<'_>> + Clone {
        description::cards(&self.results)
    }

    /// Message from the most recent failed submission, cleared when the next
    /// one starts.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }
}

/// Clears the loading flag if a [`DescriptionForm::submit`] future is
/// dropped before its request completes.
struct InFlightGuard<'a, H> {
    form: &'a mut DescriptionForm<H>,
    ticket: Ticket,
}

impl<H> Drop for InFlightGuard<'_, H> {
    fn drop(&mut self) {
        if self.form.in_flight == Some(self.ticket) {
            log::warn!("Submission {:?} cancelled before completing", self.ticket);
            self.form.abandon();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::testing::{CountingPreviews, image};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn desc(text: &str, highlights: &[&str]) -> GeneratedDescription {
        GeneratedDescription {
            generated_description: text.to_string(),
            highlights: highlights.iter().map(|h| h.to_string()).collect(),
            suggested_price_range: None,
            original_description: None,
        }
    }

    fn server_error() -> GenerateError {
        GenerateError::Server {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".into(),
        }
    }

    /// Records what it was asked for and answers with a canned result.
    struct FakeService {
        calls: AtomicUsize,
        seen: Mutex<Vec<(Vec<String>, Tone)>>,
        reply: fn() -> Result<Vec<GeneratedDescription>, GenerateError>,
    }

    impl FakeService {
        fn new(reply: fn() -> Result<Vec<GeneratedDescription>, GenerateError>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
                reply,
            }
        }
    }

    #[async_trait::async_trait]
    impl DescriptionService for FakeService {
        async fn generate(
            &self,
            files: Vec<FileHandle>,
            tone: Tone,
        ) -> Result<Vec<GeneratedDescription>, GenerateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let names = files.into_iter().map(|f| f.name).collect();
            self.seen.lock().unwrap().push((names, tone));
            (self.reply)()
        }
    }

    fn form_with(names: &[&str]) -> (DescriptionForm<crate::selection::testing::CountedPreview>, CountingPreviews) {
        let mut previews = CountingPreviews::default();
        let mut form = DescriptionForm::default();
        form.add_files(names.iter().map(|n| image(n)), &mut previews);
        (form, previews)
    }

    #[test]
    fn defaults() {
        let form: DescriptionForm<()> = DescriptionForm::default();
        assert_eq!(form.tone(), Tone::Professional);
        assert!(!form.is_loading());
        assert!(!form.can_submit());
        assert_eq!(form.submit_label(), "Generate Descriptions");
        assert_eq!(form.cards().count(), 0);
    }

    #[test]
    fn empty_selection_submit_is_noop() {
        let mut form: DescriptionForm<()> = DescriptionForm::default();
        assert!(form.begin_submit().is_none());
        assert!(!form.is_loading());
    }

    #[test]
    fn second_submit_while_loading_is_noop() {
        let (mut form, _previews) = form_with(&["a.jpg"]);
        let first = form.begin_submit().unwrap();
        assert!(form.is_loading());
        assert_eq!(form.submit_label(), "Generating...");
        assert!(form.begin_submit().is_none());

        assert!(form.complete(first.ticket, Ok(vec![desc("A", &[])])));
        assert!(!form.is_loading());
    }

    #[test]
    fn submission_snapshots_files_and_tone() {
        let (mut form, _previews) = form_with(&["a.jpg", "b.jpg"]);
        form.set_tone(Tone::Luxury);
        let sub = form.begin_submit().unwrap();
        assert_eq!(sub.tone, Tone::Luxury);
        assert_eq!(sub.files.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(), ["a.jpg", "b.jpg"]);
    }

    #[test]
    fn success_replaces_results_in_order() {
        let (mut form, _previews) = form_with(&["a.jpg"]);
        let sub = form.begin_submit().unwrap();
        form.complete(sub.ticket, Ok(vec![desc("old", &[])]));

        let sub = form.begin_submit().unwrap();
        form.complete(sub.ticket, Ok(vec![desc("one", &[]), desc("two", &[]), desc("three", &[])]));

        let texts: Vec<_> = form.cards().map(|c| c.text).collect();
        assert_eq!(texts, ["one", "two", "three"]);
    }

    #[test]
    fn failure_keeps_prior_results_and_clears_loading() {
        let (mut form, _previews) = form_with(&["a.jpg"]);
        let sub = form.begin_submit().unwrap();
        form.complete(sub.ticket, Ok(vec![desc("kept", &["h"])]));

        let sub = form.begin_submit().unwrap();
        form.complete(sub.ticket, Err(server_error()));

        assert!(!form.is_loading());
        assert_eq!(form.results(), [desc("kept", &["h"])]);
        assert!(form.last_error().unwrap().contains("500"));
    }

    #[test]
    fn next_submission_clears_error() {
        let (mut form, _previews) = form_with(&["a.jpg"]);
        let sub = form.begin_submit().unwrap();
        form.complete(sub.ticket, Err(server_error()));
        assert!(form.last_error().is_some());

        let _sub = form.begin_submit().unwrap();
        assert!(form.last_error().is_none());
    }

    #[test]
    fn stale_completion_is_ignored() {
        let (mut form, _previews) = form_with(&["a.jpg"]);
        let first = form.begin_submit().unwrap();
        form.abandon();
        assert!(!form.is_loading());

        let second = form.begin_submit().unwrap();
        assert!(!form.complete(first.ticket, Ok(vec![desc("late", &[])])));
        assert!(form.is_loading());
        assert!(form.results().is_empty());

        assert!(form.complete(second.ticket, Ok(vec![desc("fresh", &[])])));
        assert_eq!(form.results()[0].generated_description, "fresh");
    }

    #[test]
    fn completion_after_abandon_does_not_touch_state() {
        let (mut form, _previews) = form_with(&["a.jpg"]);
        let sub = form.begin_submit().unwrap();
        form.abandon();
        assert!(!form.complete(sub.ticket, Err(server_error())));
        assert!(form.last_error().is_none());
    }

    #[test]
    fn remove_and_teardown_release_previews() {
        let (mut form, previews) = form_with(&["a.jpg", "b.jpg", "c.jpg"]);
        assert!(form.remove_file(1));
        assert!(!form.remove_file(7));
        assert_eq!(previews.live.get(), 2);
        drop(form);
        assert_eq!(previews.live.get(), 0);
        assert_eq!(previews.released.get(), 3);
    }

    #[tokio::test]
    async fn submit_two_files_luxury_example() {
        let service = FakeService::new(|| {
            Ok(vec![desc("A", &["x", "y"]), desc("B", &["z"])])
        });
        let (mut form, _previews) = form_with(&["front.jpg", "side.jpg"]);
        form.set_tone(Tone::Luxury);

        assert!(form.submit(&service).await);

        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        let seen = service.seen.lock().unwrap();
        assert_eq!(seen[0].0, ["front.jpg", "side.jpg"]);
        assert_eq!(seen[0].1, Tone::Luxury);

        let cards: Vec<_> = form.cards().collect();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].text, "A");
        assert_eq!(cards[0].highlights, ["x", "y"]);
        assert_eq!(cards[1].text, "B");
        assert_eq!(cards[1].highlights, ["z"]);
        assert!(cards.iter().all(|c| c.price_range.is_none()));
        assert!(!form.is_loading());
    }

    /// Never answers within any reasonable test timeout.
    struct StalledService;

    #[async_trait::async_trait]
    impl DescriptionService for StalledService {
        async fn generate(
            &self,
            _files: Vec<FileHandle>,
            _tone: Tone,
        ) -> Result<Vec<GeneratedDescription>, GenerateError> {
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            Ok(vec![desc("too late", &[])])
        }
    }

    #[tokio::test]
    async fn cancelled_submit_clears_loading() {
        let (mut form, _previews) = form_with(&["a.jpg"]);
        let sub = form.begin_submit().unwrap();
        form.complete(sub.ticket, Ok(vec![desc("kept", &[])]));

        let elapsed = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            form.submit(&StalledService),
        )
        .await;

        assert!(elapsed.is_err());
        assert!(!form.is_loading());
        assert!(form.can_submit());
        assert_eq!(form.submit_label(), "Generate Descriptions");
        assert_eq!(form.results()[0].generated_description, "kept");
    }

    #[tokio::test]
    async fn submit_empty_sends_nothing() {
        let service = FakeService::new(|| Ok(vec![]));
        let mut form: DescriptionForm<()> = DescriptionForm::default();

        assert!(!form.submit(&service).await);
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
        assert!(!form.is_loading());
    }

    #[tokio::test]
    async fn submit_network_failure_keeps_results() {
        let ok = FakeService::new(|| Ok(vec![desc("first", &[])]));
        let failing = FakeService::new(|| {
            Err(GenerateError::Decode(
                serde_json::from_str::<Vec<GeneratedDescription>>("not json").unwrap_err(),
            ))
        });
        let (mut form, _previews) = form_with(&["a.jpg"]);

        form.submit(&ok).await;
        form.submit(&failing).await;

        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
        assert!(!form.is_loading());
        assert_eq!(form.results()[0].generated_description, "first");
        assert!(form.last_error().is_some());
    }

    #[tokio::test]
    async fn submit_against_unreachable_service() {
        let client = crate::client::DescriptionClient::new(
            "http://127.0.0.1:1",
            Some(std::time::Duration::from_secs(2)),
        )
        .unwrap();
        let (mut form, _previews) = form_with(&["a.jpg"]);

        assert!(form.submit(&client).await);
        assert!(!form.is_loading());
        assert!(form.results().is_empty());
        assert!(form.last_error().unwrap().contains("could not reach"));
    }
}
