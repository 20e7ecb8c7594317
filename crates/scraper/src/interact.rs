//! Robust element interaction protocol
//!
//! Every UI action goes through the same sequence: wait for the target to
//! be present, wait for it to be interactable, then perform the action
//! against a freshly resolved element. Each step re-queries the DOM, so a
//! partial page reload between steps surfaces as a stale fault and is
//! retried with backoff rather than aborting the caller.

use tokio::time::{sleep, Instant};

use crate::error::ScrapeError;
use crate::retry::{with_backoff, RetryPolicy};
use crate::session::BrowserSession;

/// UI action performed through the interaction protocol.
#[derive(Debug, Clone)]
pub enum Action {
    Click,
    SelectByIndex(usize),
    SelectByText(String),
    ClearAndType(String),
}

impl Action {
    fn describe(&self) -> &'static str {
        match self {
            Action::Click => "click",
            Action::SelectByIndex(_) => "select-by-index",
            Action::SelectByText(_) => "select-by-text",
            Action::ClearAndType(_) => "clear-and-type",
        }
    }
}

/// Perform `action` on `selector` with presence/interactability waits and
/// bounded retry. Exhaustion reports the fault to the caller instead of
/// raising an unrecoverable error.
pub async fn interact(
    session: &BrowserSession,
    selector: &str,
    action: &Action,
    policy: RetryPolicy,
) -> Result<(), ScrapeError> {
    let operation = format!("{} {}", action.describe(), selector);
    with_backoff(policy, &operation, || async {
        wait_for_present(session, selector).await?;
        wait_for_interactable(session, selector).await?;
        perform(session, selector, action).await
    })
    .await
}

/// Poll until the selector resolves to an element.
pub async fn wait_for_present(
    session: &BrowserSession,
    selector: &str,
) -> Result<(), ScrapeError> {
    let script = format!(
        "document.querySelector({}) !== null",
        js_string(selector)
    );
    poll_until(session, &script, selector).await
}

/// Poll until the element is visible and enabled.
pub async fn wait_for_interactable(
    session: &BrowserSession,
    selector: &str,
) -> Result<(), ScrapeError> {
    let script = format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return false;
            if (el.matches(':disabled')) return false;
            const style = window.getComputedStyle(el);
            if (style.visibility === 'hidden' || style.display === 'none') return false;
            const rect = el.getBoundingClientRect();
            return rect.width > 0 || rect.height > 0 || el.getClientRects().length > 0;
        }})()"#,
        sel = js_string(selector)
    );
    poll_until(session, &script, selector).await
}

async fn poll_until(
    session: &BrowserSession,
    script: &str,
    selector: &str,
) -> Result<(), ScrapeError> {
    let deadline = Instant::now() + session.wait_timeout();
    loop {
        if session.eval_bool(script).await? {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(ScrapeError::Timeout(selector.to_string()));
        }
        sleep(session.poll_interval()).await;
    }
}

/// Execute the action against a freshly resolved element. The scripts
/// report a status string; `missing` after a successful presence wait means
/// the DOM was swapped underneath us and maps to a stale fault.
async fn perform(
    session: &BrowserSession,
    selector: &str,
    action: &Action,
) -> Result<(), ScrapeError> {
    let sel = js_string(selector);
    let script = match action {
        Action::Click => format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return 'missing';
                el.click();
                return 'ok';
            }})()"#
        ),
        Action::SelectByIndex(index) => format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return 'missing';
                const options = el.options || [];
                if ({index} >= options.length) return 'option-not-found';
                el.selectedIndex = {index};
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return 'ok';
            }})()"#
        ),
        Action::SelectByText(text) => format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return 'missing';
                const target = {text};
                const option = Array.from(el.options || [])
                    .find(opt => (opt.text || '').trim() === target);
                if (!option) return 'option-not-found';
                el.value = option.value;
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return 'ok';
            }})()"#,
            text = js_string(text)
        ),
        Action::ClearAndType(text) => format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return 'missing';
                el.value = '';
                el.value = {text};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return 'ok';
            }})()"#,
            text = js_string(text)
        ),
    };

    let status = session.evaluate(&script).await?;
    match status.as_str().unwrap_or("unknown") {
        "ok" => Ok(()),
        "missing" => Err(ScrapeError::Stale(format!(
            "{selector} disappeared between wait and action"
        ))),
        "option-not-found" => Err(ScrapeError::Session(format!(
            "no matching option in {selector}"
        ))),
        other => Err(ScrapeError::Session(format!(
            "unexpected action status '{other}' for {selector}"
        ))),
    }
}

/// Quote a string as a JS literal.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_quoting() {
        assert_eq!(js_string("#btnGo"), "\"#btnGo\"");
        assert_eq!(js_string("it's"), "\"it's\"");
        assert_eq!(js_string("a\"b"), r#""a\"b""#);
    }

    #[test]
    fn test_action_labels() {
        assert_eq!(Action::Click.describe(), "click");
        assert_eq!(Action::SelectByIndex(2).describe(), "select-by-index");
        assert_eq!(
            Action::SelectByText("Wheat".to_string()).describe(),
            "select-by-text"
        );
        assert_eq!(
            Action::ClearAndType("02-May-2024".to_string()).describe(),
            "clear-and-type"
        );
    }
}
