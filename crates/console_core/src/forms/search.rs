use std::sync::Arc;

use tracing::debug;
use url::form_urlencoded;

use crate::collab::Navigator;

/// Keyword box on the listing screens. Submitting navigates to the same
/// listing with `?search=<keyword>`.
pub struct SearchBox {
    url: String,
    keyword: String,
    navigator: Arc<dyn Navigator>,
}

impl SearchBox {
    pub fn new(
        url: impl Into<String>,
        search: impl Into<String>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            url: url.into(),
            keyword: search.into(),
            navigator,
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn set_keyword(&mut self, keyword: impl Into<String>) {
        self.keyword = keyword.into();
    }

    pub fn target(&self) -> String {
        let encoded: String = form_urlencoded::byte_serialize(self.keyword.as_bytes()).collect();
        format!("{}?search={encoded}", self.url)
    }

    pub fn submit(&self) -> String {
        let target = self.target();
        debug!(%target, "search submitted");
        self.navigator.push(&target);
        target
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct TestNavigator {
        pushed: Mutex<Vec<String>>,
    }

    impl Navigator for TestNavigator {
        fn push(&self, target: &str) {
            self.pushed.lock().expect("lock").push(target.to_string());
        }
    }

    #[test]
    fn starts_from_current_search() {
        let search = SearchBox::new("/manager/user", "budi", Arc::new(TestNavigator::default()));
        assert_eq!(search.keyword(), "budi");
        assert_eq!(search.target(), "/manager/user?search=budi");
    }

    #[test]
    fn submit_navigates_with_encoded_keyword() {
        let navigator = Arc::new(TestNavigator::default());
        let mut search = SearchBox::new("/manager/user", "", navigator.clone());
        search.set_keyword("siti & co");

        let target = search.submit();

        assert_eq!(target, "/manager/user?search=siti+%26+co");
        assert_eq!(
            navigator.pushed.lock().expect("lock").clone(),
            vec![target]
        );
    }

    #[test]
    fn empty_keyword_still_navigates() {
        let navigator = Arc::new(TestNavigator::default());
        let search = SearchBox::new("/manager/menu", "", navigator.clone());
        assert_eq!(search.submit(), "/manager/menu?search=");
    }
}
