mod shared_queue;
