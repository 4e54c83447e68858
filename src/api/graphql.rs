//! GraphQL schema and endpoint for the run log.

use async_graphql::http::GraphiQLSource;
use async_graphql::{EmptyMutation, EmptySubscription, ErrorExtensions, ID, Object, Result, Schema};
use async_graphql_axum::GraphQL;
use axum::{Router, response::Html, routing::get};

use crate::runs::{Run, RunMetadata, RunQueryService};

pub type RunSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

/// Query endpoint over the stored runs.
#[derive(Debug)]
pub struct QueryRoot {
    service: RunQueryService,
}

#[Object]
impl QueryRoot {
    /// Data for a specific run.
    async fn run(&self, run_id: ID) -> Result<Run> {
        self.service.get_run(&run_id).await.map_err(|e| e.extend())
    }

    /// Every stored run.
    async fn runs(&self) -> Result<Vec<Run>> {
        self.service.get_runs().await.map_err(|e| e.extend())
    }

    /// Metadata for the given runs, in the order requested.
    async fn run_metadata(&self, run_ids: Vec<ID>) -> Result<Vec<RunMetadata>> {
        let run_ids: Vec<String> = run_ids.into_iter().map(String::from).collect();
        self.service
            .get_runs_metadata(&run_ids)
            .await
            .map_err(|e| e.extend())
    }

    /// Metadata for every stored run, for the runs list.
    async fn runs_list(&self) -> Result<Vec<RunMetadata>> {
        let runs = self.service.get_runs().await.map_err(|e| e.extend())?;
        Ok(runs.into_iter().map(|run| run.metadata).collect())
    }
}

pub fn build_schema(service: RunQueryService) -> RunSchema {
    Schema::build(QueryRoot { service }, EmptyMutation, EmptySubscription).finish()
}

/// Mount the schema at `path`.
///
/// POST always executes queries. With GraphiQL enabled, GET serves the
/// explorer page; otherwise GET executes queries passed in the query string.
pub fn router(schema: RunSchema, path: &str, graphiql_enabled: bool) -> Router {
    if graphiql_enabled {
        let page = GraphiQLSource::build().endpoint(path).finish();
        Router::new().route(
            path,
            get(move || {
                let page = page.clone();
                async move { Html(page) }
            })
            .post_service(GraphQL::new(schema)),
        )
    } else {
        Router::new().route_service(path, GraphQL::new(schema))
    }
}
