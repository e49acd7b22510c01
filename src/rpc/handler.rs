//! The MCP server handler: the three expense tools and the category catalog
//! resource.

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        AnnotateAble, CallToolResult, Content, Implementation, ListResourcesResult,
        PaginatedRequestParams, RawResource, ReadResourceRequestParams, ReadResourceResult,
        Resource, ResourceContents, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState, Error,
    category::{CATEGORIES_MIME_TYPE, CATEGORIES_URI, read_category_catalog},
    db::open_connection,
    expense::{
        DateRange, ExpenseId, NewExpense, create_expense, get_expenses_in_range,
        summarize_expenses,
    },
};

/// The name the server reports to clients.
pub const SERVER_NAME: &str = "Expense Tracker";

/// The arguments of the `summarize` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SummarizeArguments {
    #[serde(flatten)]
    date_range: DateRange,
    /// Only include expenses with exactly this category. Leave out, or pass
    /// null or an empty string, to include every category.
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Serialize)]
struct AddExpenseResult {
    status: &'static str,
    id: ExpenseId,
}

/// Serves the expense tools and the category catalog to one MCP client.
///
/// The handler only holds file paths, so it is cheap to create one per
/// session or per request.
#[derive(Clone)]
pub struct ExpenseServer {
    state: AppState,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ExpenseServer {
    /// Create a handler that stores expenses in the database described by
    /// `state`.
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Add a new expense to the database")]
    async fn add_expense(
        &self,
        Parameters(expense): Parameters<NewExpense>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = open_connection(&self.state.db_path)
            .and_then(|connection| create_expense(expense, &connection))
            .map(|expense| {
                tracing::debug!("created expense {}", expense.id);
                AddExpenseResult {
                    status: "OK",
                    id: expense.id,
                }
            });

        Ok(tool_result("add_expense", outcome))
    }

    #[tool(description = "List all expenses between two dates, inclusive")]
    async fn list_expenses(
        &self,
        Parameters(date_range): Parameters<DateRange>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = open_connection(&self.state.db_path)
            .and_then(|connection| get_expenses_in_range(&date_range, &connection));

        Ok(tool_result("list_expenses", outcome))
    }

    #[tool(description = "Summarize expenses by category between two dates, inclusive")]
    async fn summarize(
        &self,
        Parameters(SummarizeArguments {
            date_range,
            category,
        }): Parameters<SummarizeArguments>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = open_connection(&self.state.db_path).and_then(|connection| {
            summarize_expenses(&date_range, category.as_deref(), &connection)
        });

        Ok(tool_result("summarize", outcome))
    }
}

impl ExpenseServer {
    /// Read the resource at `uri`.
    ///
    /// # Errors
    /// Returns a "resource not found" error for any URI other than
    /// [CATEGORIES_URI], or an internal error if the catalog file cannot be
    /// read.
    fn read_resource_at(&self, uri: &str) -> Result<ReadResourceResult, McpError> {
        if uri != CATEGORIES_URI {
            tracing::debug!("rejected read of unknown resource {uri}");
            return Err(McpError::resource_not_found(
                format!("unknown resource \"{uri}\""),
                Some(json!({ "uri": uri })),
            ));
        }

        let text = read_category_catalog(&self.state.categories_path)
            .map_err(|error| McpError::internal_error(error.to_string(), None))?;

        let mut contents = ResourceContents::text(text, uri);
        if let ResourceContents::TextResourceContents { mime_type, .. } = &mut contents {
            *mime_type = Some(CATEGORIES_MIME_TYPE.to_owned());
        }

        Ok(ReadResourceResult::new(vec![contents]))
    }
}

#[tool_handler]
impl ServerHandler for ExpenseServer {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::from_build_env();
        server_info.name = SERVER_NAME.to_owned();
        server_info.version = env!("CARGO_PKG_VERSION").to_owned();

        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder()
            .enable_tools()
            .enable_resources()
            .build();
        info.server_info = server_info;
        info.instructions = Some(
            "Record expenses with add_expense, look them up with list_expenses and \
            total them per category with summarize. Read expense://categories for \
            suggested category names."
                .to_owned(),
        );

        info
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult::with_all_items(vec![
            category_catalog_resource(),
        ]))
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParams { uri, .. }: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        self.read_resource_at(&uri)
    }
}

fn category_catalog_resource() -> Resource {
    let mut resource = RawResource::new(CATEGORIES_URI, "categories");
    resource.description = Some("Suggested expense categories".to_owned());
    resource.mime_type = Some(CATEGORIES_MIME_TYPE.to_owned());

    resource.no_annotation()
}

/// Turn the outcome of a tool into a tool result.
///
/// The value is sent as JSON text and as structured content. Structured
/// content must be an object, so arrays are placed under a `result` key.
/// Failures, e.g., the database file is locked, are reported with `isError`
/// set so the client sees the message.
fn tool_result<T: Serialize>(tool: &str, outcome: Result<T, Error>) -> CallToolResult {
    let value = outcome.and_then(|value| {
        serde_json::to_value(value).map_err(|error| Error::JSONSerializationError(error.to_string()))
    });

    match value {
        Ok(value) => {
            let text = value.to_string();
            let structured_content = if value.is_object() {
                value
            } else {
                json!({ "result": value })
            };

            let mut result = CallToolResult::success(vec![Content::text(text)]);
            result.structured_content = Some(structured_content);
            result
        }
        Err(error) => {
            tracing::error!("tool \"{tool}\" failed: {error}");
            CallToolResult::error(vec![Content::text(error.to_string())])
        }
    }
}
