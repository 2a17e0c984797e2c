pub mod navigate_route;
