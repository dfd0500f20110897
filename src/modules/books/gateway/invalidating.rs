use async_trait::async_trait;
use bookshelf_events::{Event, EventBus};

use super::{BookGateway, GatewayError};
use crate::modules::books::models::{Book, BookFields};
use crate::modules::books::query::BookQuery;

/// Cache key of the book list page.
pub const LIST_PAGE: &str = "/home";

/// Cache key of one book's detail page.
pub fn detail_page(id: &str) -> String {
    format!("{LIST_PAGE}/{id}")
}

/// Publishes page invalidations after every successful mutation.
pub struct InvalidatingGateway<G> {
    inner: G,
    events: EventBus,
}

impl<G: BookGateway> InvalidatingGateway<G> {
    pub fn new(inner: G, events: EventBus) -> Self {
        Self { inner, events }
    }

    fn invalidate(&self, id: &str) {
        self.events.publish(Event::page_invalidated(LIST_PAGE));
        self.events.publish(Event::page_invalidated(detail_page(id)));
    }
}

#[async_trait]
impl<G: BookGateway> BookGateway for InvalidatingGateway<G> {
    async fn list(&self, query: &BookQuery) -> Result<Vec<Book>, GatewayError> {
        self.inner.list(query).await
    }

    async fn get(&self, id: &str) -> Result<Book, GatewayError> {
        self.inner.get(id).await
    }

    async fn insert(&self, fields: BookFields) -> Result<String, GatewayError> {
        let id = self.inner.insert(fields).await?;
        self.invalidate(&id);
        Ok(id)
    }

    async fn update(&self, id: &str, fields: BookFields) -> Result<(), GatewayError> {
        self.inner.update(id, fields).await?;
        self.invalidate(id);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), GatewayError> {
        self.inner.delete(id).await?;
        self.invalidate(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::gateway::MemoryBookGateway;
    use tokio::sync::broadcast::error::TryRecvError;

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<String> {
        let mut paths = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(Event::PageInvalidated { path }) => paths.push(path),
                Err(TryRecvError::Empty) => return paths,
                Err(other) => panic!("unexpected receive error: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn mutations_invalidate_list_and_detail_pages() {
        let events = EventBus::default();
        let mut rx = events.subscribe();
        let gateway = InvalidatingGateway::new(MemoryBookGateway::new(), events);

        let id = gateway
            .insert(BookFields::new("Clean Code", "Martin"))
            .await
            .unwrap();
        assert_eq!(drain(&mut rx), vec![LIST_PAGE.to_string(), detail_page(&id)]);

        gateway
            .update(&id, BookFields::new("Clean Code", "Robert C. Martin"))
            .await
            .unwrap();
        assert_eq!(drain(&mut rx), vec!["/home".to_string(), format!("/home/{id}")]);

        gateway.delete(&id).await.unwrap();
        assert_eq!(drain(&mut rx), vec!["/home".to_string(), format!("/home/{id}")]);
    }

    #[tokio::test]
    async fn failed_mutations_and_reads_publish_nothing() {
        let events = EventBus::default();
        let mut rx = events.subscribe();
        let gateway = InvalidatingGateway::new(MemoryBookGateway::new(), events);

        assert!(gateway.insert(BookFields::new("", "Martin")).await.is_err());
        assert!(gateway.get("missing").await.is_err());
        gateway
            .list(&BookQuery::all(crate::modules::books::query::SortKey::Newest))
            .await
            .unwrap();

        assert!(drain(&mut rx).is_empty());
    }
}
