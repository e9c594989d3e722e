pub mod shared {
    pub mod core {
        pub mod concurrency;
        pub mod errors;
        pub mod event_data;
        pub mod naming;
        pub mod stream_head;
    }
    pub mod infrastructure {
        pub mod event_store;
        pub mod state_store;
    }
}

pub mod modules {
    pub mod streams {
        pub mod use_cases {
            pub mod append_to_stream {
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod load_event_stream {
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod get_stream_head {
                pub mod inbound {
                    pub mod http;
                }
            }
        }
    }
}

pub mod shell;
