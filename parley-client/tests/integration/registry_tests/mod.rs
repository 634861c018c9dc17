mod test_engine_rejection_closes_session;
mod test_remove_session_idempotent;
mod test_room_mismatch_discarded;
