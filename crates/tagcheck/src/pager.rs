use serde_json::Value;

use crate::prelude::*;
use crate::query;
use crate::search::Hit;

/// Pages through the documents matching a query, using the sort values
/// of the last document of a page as cursor of the next page.
pub(crate) struct Pager<'a, S> {
    index: &'a S,
    index_name: &'a str,
    query: Value,
    sort_field: &'a str,
    page_size: usize,
    cursor: Option<Vec<Value>>,
    done: bool,
}

impl<'a, S: SearchIndex> Pager<'a, S> {
    pub(crate) fn new(
        index: &'a S,
        index_name: &'a str,
        query: Value,
        sort_field: &'a str,
        page_size: usize,
    ) -> Self {
        Self {
            index,
            index_name,
            query,
            sort_field,
            page_size: page_size.max(1),
            cursor: None,
            done: false,
        }
    }

    /// Requests the next page. Returns `None` once all documents have
    /// been returned.
    pub(crate) async fn next_page(&mut self) -> TagcheckResult<Option<Vec<Hit>>> {
        if self.done {
            return Ok(None);
        }

        let body = query::page(
            &self.query,
            self.sort_field,
            self.page_size,
            self.cursor.as_deref(),
        );

        let hits = self.index.search(self.index_name, &body).await?.hits();
        if hits.len() < self.page_size {
            self.done = true;
        }

        match hits.last() {
            Some(last) if !last.sort.is_empty() => {
                self.cursor = Some(last.sort.clone());
            }
            Some(_) => bail!("document without sort values in {}", self.index_name),
            None => return Ok(None),
        }

        Ok(Some(hits))
    }
}

/// Collects all documents matching a query.
pub(crate) async fn collect_all<S: SearchIndex>(
    mut pager: Pager<'_, S>,
) -> TagcheckResult<Vec<Hit>> {
    let mut hits = vec![];
    while let Some(page) = pager.next_page().await? {
        hits.extend(page);
    }

    Ok(hits)
}
