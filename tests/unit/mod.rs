mod common {
    mod cache_tests;
    mod compression_tests;
    mod time_tests;
}

mod config {
    mod settings_tests;
    mod store_tests;
}

mod ocs {
    mod response_tests;
}

mod talk {
    mod capability_tests;
    mod classify_tests;
    mod delegation_tests;
    mod meta_tests;
    mod room_tests;
    mod sharee_tests;
}

mod carddav {
    mod search_tests;
    mod vcard_tests;
}

mod login {
    mod flow_tests;
}
