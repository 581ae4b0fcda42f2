/// Query-shape tests against sea-orm's mock connection
pub mod mock_tests;
